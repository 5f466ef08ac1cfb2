//! First-person camera.

use glam::{Mat4, Vec3};
use crate::math::{look_at, rotation_matrix};

/// Position and view direction of the observer
///
/// The view matrix is derived on demand; the camera itself is plain data
/// and is snapshotted into the render state at `begin_frame`.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    direction: Vec3,
}

impl Camera {
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            direction: Vec3::NEG_Z,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Unit view direction
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
    }

    /// Point the camera at a world position
    pub fn look_at(&mut self, target: Vec3) {
        self.direction = (target - self.position).normalize_or_zero();
        if self.direction == Vec3::ZERO {
            self.direction = Vec3::NEG_Z;
        }
    }

    /// Rotate the view direction by yaw (about world Y), then pitch (about
    /// the camera's right axis)
    pub fn rotate(&mut self, yaw: f32, pitch: f32) {
        let yawed = rotation_matrix(Vec3::new(0.0, yaw, 0.0)) * self.direction;

        let right = yawed.cross(Vec3::Y).normalize_or_zero();
        let pitched = Mat4::from_axis_angle(right, pitch).transform_vector3(yawed);

        // Refuse pitches that would flip over the poles
        if pitched.cross(Vec3::Y).length_squared() > 1e-6 {
            self.direction = pitched.normalize();
        } else {
            self.direction = yawed.normalize();
        }
    }

    /// View matrix for the current position and direction
    pub fn matrix(&self) -> Mat4 {
        look_at(self.position, self.position + self.direction)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
