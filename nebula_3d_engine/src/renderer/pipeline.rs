//! Pipeline cache and draw-call recording.
//!
//! Every `(mesh feature set, material feature set)` combination maps to one
//! compiled pipeline. Shader variants are selected with preprocessor
//! defines derived from the feature flags, and the vertex input layout
//! follows the mesh's canonical attribute order. All compilation happens
//! before the render loop starts; a cache miss at render time is a
//! programming error surfaced as `FeatureSetUncompiled`.

use std::hash::{Hash, Hasher};
use rustc_hash::{FxHashMap, FxHasher};
use bytemuck::bytes_of;
use crate::error::{Error, Result};
use crate::resource::{
    MaterialFeatureSet, MaterialFlags, MeshFeatureSet, MeshFlags, ResourceManager,
};
use super::graphics_device::{DescriptorSetId, DevicePipelineId, GraphicsDevice, PipelineDesc};
use super::render_graph::RenderNode;

/// Identity of one pipeline variant
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub mesh_features: MeshFeatureSet,
    pub material_features: MaterialFeatureSet,
}

/// Stable hash of a pipeline key, used as a render-graph key dimension
pub fn pipeline_hash(key: &PipelineKey) -> i64 {
    let mut hasher = FxHasher::default();
    key.hash(&mut hasher);
    hasher.finish() as i64
}

/// Shader preprocessor defines for a pipeline variant
pub fn shader_defines(key: &PipelineKey) -> Vec<String> {
    let mut defines = Vec::new();

    if key.mesh_features.flags.contains(MeshFlags::IS_INSTANCED) {
        defines.push("INSTANCED".to_string());
    }
    if key.mesh_features.flags.contains(MeshFlags::IS_SKYBOX) {
        defines.push("SKYBOX".to_string());
    }
    if key.mesh_features.flags.contains(MeshFlags::IS_ANIMATED) {
        defines.push("ANIMATED".to_string());
    }
    if key
        .material_features
        .flags
        .contains(MaterialFlags::HAS_NORMAL_MAP)
    {
        defines.push("NORMAL_MAPPING".to_string());
    }
    if key
        .material_features
        .flags
        .contains(MaterialFlags::HAS_TEXTURE)
    {
        defines.push("TEXTURE_MAPPING".to_string());
    }

    defines
}

/// A compiled pipeline and its recording logic
pub struct Pipeline {
    device_pipeline: DevicePipelineId,
}

/// Bound state carried across draw calls within one render pass
///
/// `Pipeline::record` compares against this and emits bind commands only on
/// change; the sorted render graph makes runs of identical state long.
#[derive(Default)]
pub struct BindState {
    pipeline: Option<DevicePipelineId>,
    descriptor_sets: Vec<DescriptorSetId>,
}

impl Pipeline {
    /// Record the draw for one render-graph node
    pub fn record(
        &self,
        device: &mut dyn GraphicsDevice,
        resources: &ResourceManager,
        node: &RenderNode,
        bind_state: &mut BindState,
        current_frame: usize,
    ) -> Result<()> {
        if bind_state.pipeline != Some(self.device_pipeline) {
            device.bind_pipeline(self.device_pipeline)?;
            bind_state.pipeline = Some(self.device_pipeline);
            bind_state.descriptor_sets.clear();
        }

        let sets = vec![
            resources.global_descriptor_set(current_frame),
            resources.material_descriptor_set(node.material().id)?,
        ];
        if bind_state.descriptor_sets != sets {
            device.bind_descriptor_sets(&sets)?;
            bind_state.descriptor_sets = sets;
        }

        let buffers = resources.mesh_buffers(node.mesh().id)?;
        device.bind_vertex_buffer(buffers.vertex_buffer)?;
        device.bind_index_buffer(buffers.index_buffer)?;

        match node {
            RenderNode::Default { model_matrix, .. } => {
                device.push_constants(bytes_of(model_matrix))?;
                device.draw_indexed(buffers.index_count, 1)?;
            }
            RenderNode::Instanced { mesh, .. } => {
                let instance_buffer = buffers.instance_buffer.ok_or_else(|| {
                    Error::InvalidResource(format!("mesh {} has no instance buffer", mesh.id))
                })?;
                device.bind_instance_buffer(instance_buffer)?;
                device.draw_indexed(buffers.index_count, buffers.instance_count)?;
            }
            RenderNode::Skybox { .. } => {
                device.draw_indexed(buffers.index_count, 1)?;
            }
        }

        Ok(())
    }
}

/// Map from feature-set combinations to compiled pipelines
#[derive(Default)]
pub struct PipelineCache {
    pipelines: FxHashMap<PipelineKey, Pipeline>,
}

impl PipelineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile the pipeline for a feature-set combination
    ///
    /// Already-compiled combinations are a no-op, so callers can compile
    /// eagerly per model without tracking duplicates.
    pub fn compile(
        &mut self,
        device: &mut dyn GraphicsDevice,
        mesh_features: &MeshFeatureSet,
        material_features: &MaterialFeatureSet,
    ) -> Result<()> {
        let key = PipelineKey {
            mesh_features: mesh_features.clone(),
            material_features: *material_features,
        };

        if self.pipelines.contains_key(&key) {
            return Ok(());
        }

        let desc = PipelineDesc {
            defines: shader_defines(&key),
            vertex_layout: key.mesh_features.vertex_layout.clone(),
            instanced: key.mesh_features.flags.contains(MeshFlags::IS_INSTANCED),
            double_sided: key
                .material_features
                .flags
                .contains(MaterialFlags::IS_DOUBLE_SIDED),
            transparent: key
                .material_features
                .flags
                .contains(MaterialFlags::HAS_TRANSPARENCY),
        };

        let device_pipeline = device.create_pipeline(desc)?;
        self.pipelines.insert(
            key,
            Pipeline {
                device_pipeline,
            },
        );

        Ok(())
    }

    /// Pipeline for a feature-set combination
    ///
    /// # Errors
    ///
    /// `FeatureSetUncompiled` if the combination was never compiled.
    pub fn get(
        &self,
        mesh_features: &MeshFeatureSet,
        material_features: &MaterialFeatureSet,
    ) -> Result<&Pipeline> {
        let key = PipelineKey {
            mesh_features: mesh_features.clone(),
            material_features: *material_features,
        };

        self.pipelines.get(&key).ok_or(Error::FeatureSetUncompiled)
    }

    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipelines.is_empty()
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
