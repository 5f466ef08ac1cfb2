/// Tests for the spatial system

use super::*;
use glam::{Mat4, Vec2, Vec3};

fn make_system() -> SpatialSystem {
    SpatialSystem::new(Vec2::new(-400.0, -400.0), Vec2::new(1200.0, 1200.0))
}

fn add_entity(system: &mut SpatialSystem, id: u64, pos: Vec3, radius: f32) -> EntityId {
    let entity_id = EntityId(id);
    system.add(SpatialComponent::new(
        entity_id,
        Mat4::from_translation(pos),
        radius,
    ));
    entity_id
}

#[test]
fn test_add_and_get() {
    let mut system = make_system();
    let id = add_entity(&mut system, 1, Vec3::new(10.0, 0.0, 20.0), 5.0);

    assert!(system.has(id));
    let component = system.get(id).unwrap();
    assert_eq!(component.entity_id(), id);
    assert_eq!(component.radius(), 5.0);
    assert_eq!(
        crate::math::get_translation(component.abs_transform()),
        Vec3::new(10.0, 0.0, 20.0)
    );
}

#[test]
fn test_remove() {
    let mut system = make_system();
    let id = add_entity(&mut system, 1, Vec3::ZERO, 1.0);

    assert!(system.remove(id).is_some());
    assert!(!system.has(id));
    assert!(system.remove(id).is_none());
}

#[test]
fn test_get_intersecting_finds_nearby_entity() {
    let mut system = make_system();
    let near = add_entity(&mut system, 1, Vec3::new(100.0, 0.0, 100.0), 2.0);
    let far = add_entity(&mut system, 2, Vec3::new(900.0, 0.0, 900.0), 2.0);

    let poly = vec![
        Vec2::new(80.0, 80.0),
        Vec2::new(120.0, 80.0),
        Vec2::new(120.0, 120.0),
        Vec2::new(80.0, 120.0),
    ];

    let visible = system.get_intersecting(&poly);
    assert!(visible.contains(&near));
    assert!(!visible.contains(&far));
}

#[test]
fn test_get_intersecting_uses_bounding_disc() {
    let mut system = make_system();

    // Centre outside the polygon, but the bounding disc reaches into it
    let id = add_entity(&mut system, 1, Vec3::new(130.0, 0.0, 100.0), 20.0);

    let poly = vec![
        Vec2::new(80.0, 80.0),
        Vec2::new(120.0, 80.0),
        Vec2::new(120.0, 120.0),
        Vec2::new(80.0, 120.0),
    ];

    assert!(system.get_intersecting(&poly).contains(&id));
}

#[test]
fn test_update_is_noop() {
    let mut system = make_system();
    let id = add_entity(&mut system, 1, Vec3::new(5.0, 0.0, 5.0), 1.0);

    system.update();
    assert!(system.has(id));
}
