//! Collision system — extruded polygonal volumes and swept-circle movement.
//!
//! Collision geometry is a set of volumes: a 2D perimeter extruded upwards
//! by a height, with the top face acting as a walkable floor. Movement is a
//! swept circle in the XZ plane against the vertical walls of volumes too
//! tall to step onto; penetrations are resolved iteratively by pushing the
//! circle out along the wall normal, which produces wall sliding.
//!
//! Two grids index the same item list: `edge_grid` by perimeter only (for
//! movement queries) and `area_grid` by perimeter and area (for "which
//! floors am I over" altitude queries).

use glam::{Vec2, Vec3, Vec4Swizzles};
use rustc_hash::FxHashMap;
use crate::engine_warn;
use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::math::{
    line_segment_circle_intersect, point_is_inside_poly, projection_onto_line, to_ground, Line,
    LineSegment,
};
use crate::spatial_system::SpatialComponent;
use crate::system::{Component, EntityId, System};

const GRID_W: usize = 50;
const GRID_H: usize = 50;

/// Penetration resolution recursion limit
const MAX_RESOLUTION_DEPTH: u32 = 10;

/// Push-off factor applied to penetration adjustments. Slightly over 1 so
/// a resolved circle does not immediately re-intersect the same wall.
const PUSH_OFF: f32 = 1.01;

/// An extruded polygonal collision volume in entity-local space
#[derive(Debug, Clone)]
pub struct CollisionComponent {
    entity_id: EntityId,
    perimeter: Vec<Vec2>,
    height: f32,
}

impl CollisionComponent {
    pub fn new(entity_id: EntityId, perimeter: Vec<Vec2>, height: f32) -> Self {
        Self {
            entity_id,
            perimeter,
            height,
        }
    }

    /// Entity-local perimeter (ordered, implicitly closed)
    pub fn perimeter(&self) -> &[Vec2] {
        &self.perimeter
    }

    /// Extrusion height above the entity origin
    pub fn height(&self) -> f32 {
        self.height
    }
}

impl Component for CollisionComponent {
    fn entity_id(&self) -> EntityId {
        self.entity_id
    }
}

/// A volume resolved into world space
struct CollisionItem {
    component: CollisionComponent,
    /// World-space perimeter (XZ)
    abs_perimeter: Vec<Vec2>,
    /// World-space floor height (Y of the extruded top face)
    abs_height: f32,
}

/// Registry of collision volumes with movement and altitude queries
///
/// Grids hold indices into the item list rather than references, so removed
/// items simply leave a dead slot behind and queries skip it.
pub struct CollisionSystem {
    items: Vec<Option<CollisionItem>>,
    item_index: FxHashMap<EntityId, usize>,
    edge_grid: Option<Grid<usize, GRID_W, GRID_H>>,
    area_grid: Option<Grid<usize, GRID_W, GRID_H>>,
}

impl CollisionSystem {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            item_index: FxHashMap::default(),
            edge_grid: None,
            area_grid: None,
        }
    }

    /// Allocate the spatial grids over the given world rectangle
    ///
    /// Calling again replaces the grids with empty ones: volumes added
    /// before the call stay in the registry but drop out of the spatial
    /// index, so altitude and movement queries no longer see them.
    pub fn initialise(&mut self, world_min: Vec2, world_max: Vec2) {
        self.edge_grid = Some(Grid::new(world_min, world_max));
        self.area_grid = Some(Grid::new(world_min, world_max));
    }

    /// Add a volume, transforming its perimeter into world space through the
    /// owning entity's spatial component
    ///
    /// # Errors
    ///
    /// `NotInitialised` before [`initialise`](Self::initialise);
    /// `DegeneratePolygon` for perimeters with fewer than 3 vertices.
    pub fn add(&mut self, component: CollisionComponent, spatial: &SpatialComponent) -> Result<()> {
        if self.edge_grid.is_none() {
            return Err(Error::NotInitialised("Collision system"));
        }

        if component.perimeter.len() < 3 {
            return Err(Error::DegeneratePolygon(format!(
                "collision volume for entity {} has {} perimeter vertices",
                component.entity_id,
                component.perimeter.len()
            )));
        }

        let transform = spatial.abs_transform();
        let mut abs_perimeter = Vec::with_capacity(component.perimeter.len());
        let mut abs_height = 0.0;

        for p in &component.perimeter {
            let world = *transform * glam::Vec4::new(p.x, component.height, p.y, 1.0);
            abs_perimeter.push(world.xz());
            abs_height = world.y;
        }

        let index = self.items.len();
        if let Some(grid) = self.edge_grid.as_mut() {
            grid.add_by_perimeter(&abs_perimeter, index);
        }
        if let Some(grid) = self.area_grid.as_mut() {
            grid.add_by_area(&abs_perimeter, index);
        }

        self.item_index.insert(component.entity_id, index);
        self.items.push(Some(CollisionItem {
            component,
            abs_perimeter,
            abs_height,
        }));

        Ok(())
    }

    /// Height of `pos` above the highest floor containing it
    ///
    /// When volumes overlap the result is measured against the maximum of
    /// all containing floor heights.
    ///
    /// # Errors
    ///
    /// `NotInitialised` before `initialise`; `OutsideAllVolumes` if no
    /// volume's perimeter contains the position; `OutOfBounds` if the
    /// position is outside the world rectangle.
    pub fn altitude(&self, pos3: Vec3) -> Result<f32> {
        let grid = self
            .area_grid
            .as_ref()
            .ok_or(Error::NotInitialised("Collision system"))?;

        let pos = to_ground(pos3);

        let mut highest_floor: Option<f32> = None;
        for &index in grid.query_point(pos)? {
            let Some(item) = self.items[index].as_ref() else {
                continue;
            };
            if point_is_inside_poly(pos, &item.abs_perimeter)
                && highest_floor.map_or(true, |h| item.abs_height > h)
            {
                highest_floor = Some(item.abs_height);
            }
        }

        match highest_floor {
            Some(floor) => Ok(pos3.y - floor),
            None => Err(Error::OutsideAllVolumes),
        }
    }

    /// Resolve a movement attempt against the collision volumes
    ///
    /// Sweeps a circle of `radius` from `pos3` by `delta` in the XZ plane.
    /// Volumes whose floor is within `step_height` of the current position
    /// permit entry (the mover steps onto them). Returns the resolved delta;
    /// movement clear of all walls comes back unchanged.
    ///
    /// # Errors
    ///
    /// `NotInitialised` before `initialise`. Resolution failure (recursion
    /// limit) is not an error: it logs a warning and yields a zero delta.
    pub fn try_move(
        &self,
        pos3: Vec3,
        delta: Vec3,
        radius: f32,
        step_height: f32,
    ) -> Result<Vec3> {
        if self.edge_grid.is_none() {
            return Err(Error::NotInitialised("Collision system"));
        }

        Ok(self.resolve_move(pos3, delta, radius, step_height, 0))
    }

    fn resolve_move(
        &self,
        pos3: Vec3,
        delta: Vec3,
        radius: f32,
        step_height: f32,
        depth: u32,
    ) -> Vec3 {
        if depth > MAX_RESOLUTION_DEPTH {
            engine_warn!(
                "nebula::CollisionSystem",
                "Max depth reached resolving movement at ({}, {}, {})",
                pos3.x,
                pos3.y,
                pos3.z
            );
            return Vec3::ZERO;
        }

        let next_pos3 = pos3 + delta;
        let next_pos = to_ground(next_pos3);

        let segments = self.intersecting_wall_segments(next_pos3, radius, step_height);

        let mut smallest_adjustment = f32::MAX;
        let mut final_delta = delta;

        for segment in &segments {
            let line = Line::through(segment.a, segment.b);
            let foot = projection_onto_line(&line, next_pos);
            let to_line = next_pos - foot;

            let adjustment = to_line.normalize_or_zero() * (radius - to_line.length()) * PUSH_OFF;
            let adjustment3 = Vec3::new(adjustment.x, 0.0, adjustment.y);

            let new_delta =
                self.resolve_move(pos3, delta + adjustment3, radius, step_height, depth + 1);

            let adjustment_size = (new_delta - delta).length();
            if adjustment_size < smallest_adjustment {
                final_delta = new_delta;
                smallest_adjustment = adjustment_size;
            }
        }

        final_delta
    }

    /// Wall segments of non-enterable volumes intersecting the swept circle
    fn intersecting_wall_segments(
        &self,
        pos3: Vec3,
        radius: f32,
        step_height: f32,
    ) -> Vec<LineSegment> {
        let Some(grid) = self.edge_grid.as_ref() else {
            return Vec::new();
        };

        let pos = to_ground(pos3);
        let mut segments = Vec::new();

        for index in grid.query_disc(pos, radius) {
            let Some(item) = self.items[index].as_ref() else {
                continue;
            };

            // Floors within stepping range never block
            if item.abs_height - pos3.y <= step_height {
                continue;
            }

            let n = item.abs_perimeter.len();
            for i in 0..n {
                let segment = LineSegment::new(
                    item.abs_perimeter[i],
                    item.abs_perimeter[(i + 1) % n],
                );
                if line_segment_circle_intersect(&segment, pos, radius) {
                    segments.push(segment);
                }
            }
        }

        segments
    }
}

impl Default for CollisionSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for CollisionSystem {
    type Component = CollisionComponent;

    fn remove(&mut self, entity_id: EntityId) -> Option<CollisionComponent> {
        let index = self.item_index.remove(&entity_id)?;
        self.items[index].take().map(|item| item.component)
    }

    fn has(&self, entity_id: EntityId) -> bool {
        self.item_index.contains_key(&entity_id)
    }

    fn get(&self, entity_id: EntityId) -> Option<&CollisionComponent> {
        let index = *self.item_index.get(&entity_id)?;
        self.items[index].as_ref().map(|item| &item.component)
    }

    fn get_mut(&mut self, entity_id: EntityId) -> Option<&mut CollisionComponent> {
        let index = *self.item_index.get(&entity_id)?;
        self.items[index].as_mut().map(|item| &mut item.component)
    }

    fn update(&mut self) {}
}

#[cfg(test)]
#[path = "collision_system_tests.rs"]
mod tests;
