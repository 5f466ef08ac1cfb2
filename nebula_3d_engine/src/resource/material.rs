//! Material resources.

use bitflags::bitflags;
use glam::Vec4;
use super::RenderItemId;

bitflags! {
    /// Material capabilities that select a shader variant
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MaterialFlags: u32 {
        const HAS_TRANSPARENCY = 1 << 0;
        const HAS_TEXTURE      = 1 << 1;
        const HAS_NORMAL_MAP   = 1 << 2;
        const HAS_CUBE_MAP     = 1 << 3;
        const IS_DOUBLE_SIDED  = 1 << 4;
    }
}

/// Material capability flags; one half of a pipeline key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MaterialFeatureSet {
    pub flags: MaterialFlags,
}

/// CPU-side material description handed to the resource store
///
/// Texture references are ids of resources previously added to the store;
/// they must stay alive for as long as the material does.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    pub feature_set: MaterialFeatureSet,
    /// Base colour factor (RGBA)
    pub colour: Vec4,
    pub texture: Option<RenderItemId>,
    pub normal_map: Option<RenderItemId>,
    pub cube_map: Option<RenderItemId>,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
}

impl Material {
    pub fn new(feature_set: MaterialFeatureSet) -> Self {
        Self {
            name: String::new(),
            feature_set,
            colour: Vec4::ONE,
            texture: None,
            normal_map: None,
            cube_map: None,
            metallic_factor: 0.0,
            roughness_factor: 0.0,
        }
    }
}

/// Cheap reference to a material owned by the resource store
#[derive(Debug, Clone, Copy)]
pub struct MaterialHandle {
    pub id: RenderItemId,
    pub features: MaterialFeatureSet,
}
