/// Tests for the render system

use super::*;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use glam::{Mat4, Vec3};
use crate::math::point_is_inside_poly;
use crate::renderer::mock_graphics_device::MockGraphicsDevice;
use crate::renderer::{Renderer, RendererConfig};
use crate::resource::{
    cuboid, Material, MaterialFeatureSet, MeshFlags, SharedGraphicsDevice,
};
use crate::spatial_system::SpatialComponent;

fn dummy_handles() -> (MeshHandle, MaterialHandle) {
    (
        MeshHandle {
            id: 1,
            features: Default::default(),
            transform: Mat4::IDENTITY,
        },
        MaterialHandle {
            id: 2,
            features: Default::default(),
        },
    )
}

#[test]
fn test_registry_roundtrip() {
    let mut system = RenderSystem::new();
    let (mesh, material) = dummy_handles();

    system.add(RenderComponent::Instance {
        entity_id: EntityId(5),
        mesh,
        material,
    });

    assert!(system.has(EntityId(5)));
    assert_eq!(system.get(EntityId(5)).unwrap().entity_id(), EntityId(5));

    assert!(system.remove(EntityId(5)).is_some());
    assert!(!system.has(EntityId(5)));
}

#[test]
fn test_model_component_carries_submodels() {
    let mut system = RenderSystem::new();
    let (mesh, material) = dummy_handles();

    system.add(RenderComponent::Model {
        entity_id: EntityId(1),
        submodels: vec![
            Submodel {
                mesh: mesh.clone(),
                material,
            },
            Submodel { mesh, material },
        ],
    });

    match system.get(EntityId(1)).unwrap() {
        RenderComponent::Model { submodels, .. } => assert_eq!(submodels.len(), 2),
        _ => panic!("expected model component"),
    }
}

#[test]
fn test_frustum_perimeter_covers_view_direction() {
    let mut camera = Camera::new();
    camera.set_position(Vec3::new(0.0, 1.7, 0.0));
    camera.look_at(Vec3::new(0.0, 1.7, -10.0)); // facing -Z

    let params = ViewParams {
        h_fov: std::f32::consts::FRAC_PI_2,
        v_fov: 1.0,
        aspect_ratio: 1.0,
        near_plane: 1.0,
        far_plane: 10.0,
    };

    let perimeter = frustum_perimeter(&camera, &params);
    assert_eq!(perimeter.len(), 4);

    // In front of the camera, between near and far
    assert!(point_is_inside_poly(Vec2::new(0.0, -5.0), &perimeter));
    assert!(point_is_inside_poly(Vec2::new(3.0, -5.0), &perimeter));

    // Behind the camera, past the far plane, or outside the FOV
    assert!(!point_is_inside_poly(Vec2::new(0.0, 5.0), &perimeter));
    assert!(!point_is_inside_poly(Vec2::new(0.0, -15.0), &perimeter));
    assert!(!point_is_inside_poly(Vec2::new(8.0, -5.0), &perimeter));
}

#[test]
fn test_frustum_perimeter_follows_heading() {
    let mut camera = Camera::new();
    camera.set_position(Vec3::new(10.0, 0.0, 10.0));
    camera.look_at(Vec3::new(20.0, 0.0, 10.0)); // facing +X

    let params = ViewParams {
        h_fov: std::f32::consts::FRAC_PI_2,
        v_fov: 1.0,
        aspect_ratio: 1.0,
        near_plane: 1.0,
        far_plane: 10.0,
    };

    let perimeter = frustum_perimeter(&camera, &params);

    assert!(point_is_inside_poly(Vec2::new(15.0, 10.0), &perimeter));
    assert!(!point_is_inside_poly(Vec2::new(5.0, 10.0), &perimeter));
}

#[test]
fn test_update_frame_stages_only_visible_entities() {
    let concrete = Arc::new(Mutex::new(MockGraphicsDevice::new()));
    let shared: SharedGraphicsDevice = concrete.clone();
    let mut renderer = Renderer::new(shared, RendererConfig::default()).unwrap();

    let mut mesh_data = cuboid(1.0, 1.0, 1.0, glam::Vec2::ONE);
    mesh_data.feature_set.flags |= MeshFlags::IS_INSTANCED;
    mesh_data.max_instances = 8;
    let mesh = renderer.add_mesh(mesh_data).unwrap();
    let material = renderer
        .add_material(Material::new(MaterialFeatureSet::default()))
        .unwrap();
    renderer
        .compile_pipeline(&mesh.features, &material.features)
        .unwrap();

    let mut spatial = SpatialSystem::new(Vec2::new(0.0, 0.0), Vec2::new(100.0, 100.0));
    let mut render_system = RenderSystem::new();

    // Camera at (50, 0, 90) looking towards -Z
    let mut camera = Camera::new();
    camera.set_position(Vec3::new(50.0, 0.0, 90.0));
    camera.look_at(Vec3::new(50.0, 0.0, 0.0));

    // One entity in view, one behind the camera
    let visible = EntityId(1);
    spatial.add(SpatialComponent::new(
        visible,
        Mat4::from_translation(Vec3::new(50.0, 0.0, 50.0)),
        2.0,
    ));
    render_system.add(RenderComponent::Instance {
        entity_id: visible,
        mesh: mesh.clone(),
        material,
    });

    let hidden = EntityId(2);
    spatial.add(SpatialComponent::new(
        hidden,
        Mat4::from_translation(Vec3::new(50.0, 0.0, 97.0)),
        2.0,
    ));
    render_system.add(RenderComponent::Instance {
        entity_id: hidden,
        mesh: mesh.clone(),
        material,
    });

    render_system
        .update_frame(&mut renderer, &camera, &spatial)
        .unwrap();

    renderer.start().unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline && concrete.lock().unwrap().frames_presented < 2 {
        std::thread::sleep(Duration::from_millis(1));
    }
    renderer.stop();
    renderer.check_error().unwrap();

    // The visible entity is drawn as a single instance; the hidden one
    // never joins it (which would read "draw_indexed 36 2").
    let device = concrete.lock().unwrap();
    assert!(device.calls.iter().any(|c| c == "draw_indexed 36 1"));
    assert!(!device.calls.iter().any(|c| c == "draw_indexed 36 2"));
}
