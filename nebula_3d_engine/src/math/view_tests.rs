/// Tests for view/projection helpers

use super::*;
use glam::{Mat4, Vec3, Vec4};

const EPSILON: f32 = 1e-5;

#[test]
fn test_perspective_depth_range() {
    let proj = perspective(1.2, 0.9, 0.1, 100.0);

    // A point on the near plane maps to depth 0
    let near_point = proj * Vec4::new(0.0, 0.0, -0.1, 1.0);
    assert!((near_point.z / near_point.w).abs() < EPSILON);

    // A point on the far plane maps to depth 1
    let far_point = proj * Vec4::new(0.0, 0.0, -100.0, 1.0);
    assert!((far_point.z / far_point.w - 1.0).abs() < 1e-4);
}

#[test]
fn test_perspective_flips_y() {
    let proj = perspective(1.2, 0.9, 0.1, 100.0);

    // A point above the view axis ends up below it in image space
    let p = proj * Vec4::new(0.0, 1.0, -10.0, 1.0);
    assert!(p.y / p.w < 0.0);
}

#[test]
fn test_perspective_edge_of_fov() {
    let h_fov = std::f32::consts::FRAC_PI_2;
    let proj = perspective(h_fov, 1.0, 0.1, 100.0);

    // A point on the right frustum edge maps to x/w = 1
    let z = -10.0f32;
    let x = -z * (h_fov * 0.5).tan();
    let p = proj * Vec4::new(x, 0.0, z, 1.0);
    assert!((p.x / p.w - 1.0).abs() < 1e-4);
}

#[test]
fn test_look_at_centres_target() {
    let view = look_at(Vec3::new(5.0, 2.0, 5.0), Vec3::new(0.0, 2.0, 0.0));

    // The target lies on the negative Z axis in view space
    let target = view * Vec4::new(0.0, 2.0, 0.0, 1.0);
    assert!(target.x.abs() < EPSILON);
    assert!(target.y.abs() < EPSILON);
    assert!(target.z < 0.0);

    // The eye maps to the origin
    let eye = view * Vec4::new(5.0, 2.0, 5.0, 1.0);
    assert!(eye.truncate().length() < EPSILON);
}

#[test]
fn test_rotation_matrix_orthonormal() {
    let r = rotation_matrix(Vec3::new(0.3, -1.2, 2.5));
    let should_be_identity = r.transpose() * r;

    let diff = should_be_identity - glam::Mat3::IDENTITY;
    for col in [diff.x_axis, diff.y_axis, diff.z_axis] {
        assert!(col.length() < 1e-5);
    }
}

#[test]
fn test_get_translation() {
    let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(get_translation(&m), Vec3::new(1.0, 2.0, 3.0));
}
