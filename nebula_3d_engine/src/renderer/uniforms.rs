//! Uniform buffer layouts shared with the shaders.
//!
//! All structs are `repr(C)` with explicit padding to match std140 layout;
//! they are uploaded byte-for-byte with bytemuck.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};

/// Maximum number of lights per frame
pub const MAX_LIGHTS: usize = 4;

/// Per-frame camera matrices (set 0, binding 0)
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUbo {
    pub view_matrix: Mat4,
    pub proj_matrix: Mat4,
}

impl Default for CameraUbo {
    fn default() -> Self {
        Self {
            view_matrix: Mat4::IDENTITY,
            proj_matrix: Mat4::IDENTITY,
        }
    }
}

/// One light's worth of lighting data
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
pub struct Light {
    pub world_pos: Vec3,
    pub _pad0: f32,
    pub colour: Vec3,
    pub ambient: f32,
    pub specular: f32,
    pub _pad1: [f32; 3],
}

/// Per-frame lighting state (set 0, binding 1)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
pub struct LightingUbo {
    pub view_pos: Vec3,
    pub num_lights: u32,
    pub lights: [Light; MAX_LIGHTS],
}

/// Per-material factors (material set, binding 0)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, Pod, Zeroable)]
pub struct MaterialUbo {
    pub colour: Vec4,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub _pad0: [f32; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ubo_sizes_match_shader_layout() {
        assert_eq!(std::mem::size_of::<CameraUbo>(), 128);
        assert_eq!(std::mem::size_of::<Light>(), 48);
        assert_eq!(std::mem::size_of::<LightingUbo>(), 16 + 48 * MAX_LIGHTS);
        assert_eq!(std::mem::size_of::<MaterialUbo>(), 32);
    }
}
