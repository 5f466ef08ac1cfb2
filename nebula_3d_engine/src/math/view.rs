//! View and projection matrices, plus small transform helpers.

use glam::{EulerRot, Mat3, Mat4, Vec2, Vec3, Vec4};

/// Perspective projection from separate horizontal and vertical FOVs
///
/// Produces a frustum with Y pointing down in image space (Vulkan
/// convention) and depth mapped to `[0, 1]`. Both FOV angles are in
/// radians.
pub fn perspective(h_fov: f32, v_fov: f32, near: f32, far: f32) -> Mat4 {
    let t = -near * (v_fov * 0.5).tan();
    let b = -t;
    let r = near * (h_fov * 0.5).tan();
    let l = -r;

    Mat4::from_cols(
        Vec4::new(2.0 * near / (r - l), 0.0, 0.0, 0.0),
        Vec4::new(0.0, -2.0 * near / (b - t), 0.0, 0.0),
        Vec4::new(
            (r + l) / (r - l),
            (b + t) / (b - t),
            -far / (far - near),
            -1.0,
        ),
        Vec4::new(0.0, 0.0, -far * near / (far - near), 0.0),
    )
}

/// Right-handed view matrix looking from `eye` towards `centre`
///
/// The up direction is fixed to world +Y; cameras that need roll compose it
/// separately.
pub fn look_at(eye: Vec3, centre: Vec3) -> Mat4 {
    Mat4::look_at_rh(eye, centre, Vec3::Y)
}

/// Rotation matrix from Euler angles (applied X, then Y, then Z)
pub fn rotation_matrix(euler: Vec3) -> Mat3 {
    Mat3::from_euler(EulerRot::ZYX, euler.z, euler.y, euler.x)
}

/// Translation component of a transform
pub fn get_translation(m: &Mat4) -> Vec3 {
    m.w_axis.truncate()
}

/// XZ components of a 3D point, projected onto the ground plane
pub fn to_ground(p: Vec3) -> Vec2 {
    Vec2::new(p.x, p.z)
}

#[cfg(test)]
#[path = "view_tests.rs"]
mod tests;
