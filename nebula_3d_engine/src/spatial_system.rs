//! Spatial system — per-entity transforms and the culling index.
//!
//! Each spatial component carries a transform and a bounding radius. On
//! insertion the entity is indexed into a uniform grid by its bounding disc
//! (XZ translation, radius), which makes "which entities intersect this
//! polygon" queries cheap. The render system uses exactly that query with
//! the camera's frustum perimeter for culling.

use glam::{Mat4, Vec2};
use rustc_hash::{FxHashMap, FxHashSet};
use crate::grid::Grid;
use crate::math::{get_translation, to_ground};
use crate::system::{Component, EntityId, System};

const GRID_W: usize = 100;
const GRID_H: usize = 100;

/// Transform and bounding radius of an entity
#[derive(Debug, Clone)]
pub struct SpatialComponent {
    entity_id: EntityId,
    transform: Mat4,
    radius: f32,
}

impl SpatialComponent {
    pub fn new(entity_id: EntityId, transform: Mat4, radius: f32) -> Self {
        Self {
            entity_id,
            transform,
            radius,
        }
    }

    /// Transform relative to the parent entity
    pub fn rel_transform(&self) -> &Mat4 {
        &self.transform
    }

    /// World-space transform
    ///
    /// TODO: compose with the parent chain once the scene hierarchy lands.
    /// Until then entities are flat and the relative transform is absolute.
    pub fn abs_transform(&self) -> &Mat4 {
        &self.transform
    }

    /// Bounding radius in world units
    pub fn radius(&self) -> f32 {
        self.radius
    }
}

impl Component for SpatialComponent {
    fn entity_id(&self) -> EntityId {
        self.entity_id
    }
}

/// Registry of spatial components, indexed by a uniform grid
pub struct SpatialSystem {
    components: FxHashMap<EntityId, SpatialComponent>,
    grid: Grid<EntityId, GRID_W, GRID_H>,
}

impl SpatialSystem {
    /// Create the system with its world rectangle (XZ plane)
    pub fn new(world_min: Vec2, world_max: Vec2) -> Self {
        Self {
            components: FxHashMap::default(),
            grid: Grid::new(world_min, world_max),
        }
    }

    /// Add a component and index the entity by its bounding disc
    pub fn add(&mut self, component: SpatialComponent) {
        let pos = get_translation(component.abs_transform());
        self.grid
            .add_by_disc(to_ground(pos), component.radius(), component.entity_id());
        self.components.insert(component.entity_id(), component);
    }

    /// Entities whose bounding disc may intersect the polygon
    ///
    /// Grid-level test: conservative (may report entities whose disc shares
    /// a cell with the polygon without touching it), never misses one.
    pub fn get_intersecting(&self, poly: &[Vec2]) -> FxHashSet<EntityId> {
        self.grid.query_polygon(poly)
    }
}

impl System for SpatialSystem {
    type Component = SpatialComponent;

    fn remove(&mut self, entity_id: EntityId) -> Option<SpatialComponent> {
        self.components.remove(&entity_id)
    }

    fn has(&self, entity_id: EntityId) -> bool {
        self.components.contains_key(&entity_id)
    }

    fn get(&self, entity_id: EntityId) -> Option<&SpatialComponent> {
        self.components.get(&entity_id)
    }

    fn get_mut(&mut self, entity_id: EntityId) -> Option<&mut SpatialComponent> {
        self.components.get_mut(&entity_id)
    }

    // Transforms are set eagerly; nothing to do per frame
    fn update(&mut self) {}
}

#[cfg(test)]
#[path = "spatial_system_tests.rs"]
mod tests;
