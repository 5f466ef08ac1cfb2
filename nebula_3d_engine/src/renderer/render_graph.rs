//! Per-frame draw list, sorted for state-change minimisation.
//!
//! The render graph is a sorted multimap from integer-vector keys to draw
//! nodes. Keys order draws by transparency flag first (opaque before
//! transparent), then pipeline hash, then mesh id, then material id; the
//! render loop walks the graph in key order so consecutive draws share as
//! much bound state as possible. Default-model keys carry a per-frame
//! counter as a final dimension so every staged model is a distinct entry.
//!
//! Keys compare lexicographically and only complete keys are findable: a
//! lookup with a strict prefix of an inserted key misses.

use std::collections::BTreeMap;
use glam::Mat4;
use crate::resource::{MaterialHandle, MeshHandle};

/// Ordered sequence of integers identifying one draw
pub type GraphKey = Vec<i64>;

/// A unit of draw work
#[derive(Debug, Clone)]
pub enum RenderNode {
    /// One model, one draw, unique key per staging call
    Default {
        mesh: MeshHandle,
        material: MaterialHandle,
        model_matrix: Mat4,
    },
    /// All instances of a `(mesh, material)` pair, merged across staging
    /// calls
    Instanced {
        mesh: MeshHandle,
        material: MaterialHandle,
        instances: Vec<Mat4>,
    },
    /// Background cube, at most one per frame
    Skybox {
        mesh: MeshHandle,
        material: MaterialHandle,
    },
}

impl RenderNode {
    pub fn mesh(&self) -> &MeshHandle {
        match self {
            RenderNode::Default { mesh, .. } => mesh,
            RenderNode::Instanced { mesh, .. } => mesh,
            RenderNode::Skybox { mesh, .. } => mesh,
        }
    }

    pub fn material(&self) -> &MaterialHandle {
        match self {
            RenderNode::Default { material, .. } => material,
            RenderNode::Instanced { material, .. } => material,
            RenderNode::Skybox { material, .. } => material,
        }
    }
}

/// Sorted multimap of draw nodes, rebuilt every frame
#[derive(Default, Clone)]
pub struct RenderGraph {
    nodes: BTreeMap<GraphKey, RenderNode>,
}

impl RenderGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node; an existing node under the same key is replaced
    pub fn insert(&mut self, key: GraphKey, node: RenderNode) {
        self.nodes.insert(key, node);
    }

    pub fn get(&self, key: &GraphKey) -> Option<&RenderNode> {
        self.nodes.get(key)
    }

    pub fn get_mut(&mut self, key: &GraphKey) -> Option<&mut RenderNode> {
        self.nodes.get_mut(key)
    }

    /// Nodes in lexicographic key order
    pub fn iter(&self) -> impl Iterator<Item = (&GraphKey, &RenderNode)> {
        self.nodes.iter()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
#[path = "render_graph_tests.rs"]
mod tests;
