//! Uniform spatial grid over a world rectangle.
//!
//! A `Grid` divides a fixed world rectangle into `W × H` cells, each holding
//! a set of items. Items are cheap copyable ids (entity ids, indices into an
//! item list); the same item may appear in many cells. The grid backs both
//! frustum culling (polygon queries) and collision resolution (disc and
//! point queries).

use glam::{IVec2, Vec2};
use rustc_hash::FxHashSet;
use std::hash::Hash;
use crate::error::{Error, Result};
use crate::math::point_is_inside_poly;

/// Set of grid cell coordinates, as returned by the line rasteriser
pub type GridCellList = FxHashSet<IVec2>;

/// A `W × H` uniform grid of item sets over `[world_min, world_max]`
pub struct Grid<T, const W: usize, const H: usize> {
    world_min: Vec2,
    world_max: Vec2,
    cell_w: f32,
    cell_h: f32,
    cells: Vec<FxHashSet<T>>,
}

impl<T, const W: usize, const H: usize> Grid<T, W, H>
where
    T: Copy + Eq + Hash,
{
    /// Create an empty grid spanning the given world rectangle
    pub fn new(world_min: Vec2, world_max: Vec2) -> Self {
        debug_assert!(W > 0 && H > 0, "grid dimensions must be non-zero");
        debug_assert!(
            world_max.x > world_min.x && world_max.y > world_min.y,
            "world rectangle must have positive extent"
        );

        Self {
            world_min,
            world_max,
            cell_w: (world_max.x - world_min.x) / W as f32,
            cell_h: (world_max.y - world_min.y) / H as f32,
            cells: (0..W * H).map(|_| FxHashSet::default()).collect(),
        }
    }

    /// Add `item` to every cell crossed by an edge of `poly`
    ///
    /// Cells outside the grid are silently dropped. An empty polygon is a
    /// no-op.
    pub fn add_by_perimeter(&mut self, poly: &[Vec2], item: T) {
        let n = poly.len();
        for i in 0..n {
            let p1 = poly[i];
            let p2 = poly[(i + 1) % n];

            for cell in self.cells_between_points(p1, p2) {
                if self.cell_in_range(cell) {
                    self.cell_mut(cell).insert(item);
                }
            }
        }
    }

    /// Add `item` by perimeter, then to every cell whose centre lies inside
    /// `poly`
    pub fn add_by_area(&mut self, poly: &[Vec2], item: T) {
        if poly.is_empty() {
            return;
        }

        self.add_by_perimeter(poly, item);

        for i in 0..W {
            for j in 0..H {
                if point_is_inside_poly(self.cell_centre(i, j), poly) {
                    self.cells[i * H + j].insert(item);
                }
            }
        }
    }

    /// Add `item` to every cell in the axis-aligned bounding box of the disc
    ///
    /// The box is clipped to the grid; discs partly or fully outside do not
    /// fail.
    pub fn add_by_disc(&mut self, centre: Vec2, radius: f32, item: T) {
        let p0 = self.world_to_grid(centre - Vec2::splat(radius));
        let p1 = self.world_to_grid(centre + Vec2::splat(radius));

        for i in p0.x.max(0)..=p1.x.min(W as i32 - 1) {
            for j in p0.y.max(0)..=p1.y.min(H as i32 - 1) {
                self.cells[i as usize * H + j as usize].insert(item);
            }
        }
    }

    /// Items in the cell containing `p`
    ///
    /// # Errors
    ///
    /// `OutOfBounds` if `p` lies outside the world rectangle.
    pub fn query_point(&self, p: Vec2) -> Result<&FxHashSet<T>> {
        if !self.within_bounds(p) {
            return Err(Error::OutOfBounds(p.x, p.y));
        }

        // A point on the max boundary belongs to the last cell
        let cell = self.world_to_grid(p);
        let i = (cell.x as usize).min(W - 1);
        let j = (cell.y as usize).min(H - 1);
        Ok(&self.cells[i * H + j])
    }

    /// Union of items over the cells in the disc's bounding box (clipped)
    pub fn query_disc(&self, centre: Vec2, radius: f32) -> FxHashSet<T> {
        let mut items = FxHashSet::default();

        let p0 = self.world_to_grid(centre - Vec2::splat(radius));
        let p1 = self.world_to_grid(centre + Vec2::splat(radius));

        for i in p0.x.max(0)..=p1.x.min(W as i32 - 1) {
            for j in p0.y.max(0)..=p1.y.min(H as i32 - 1) {
                items.extend(&self.cells[i as usize * H + j as usize]);
            }
        }

        items
    }

    /// Union of items over cells crossed by the polygon's edges and cells
    /// whose centre lies inside the polygon
    ///
    /// The interior pass only scans the bounding box of the perimeter cells.
    /// Silently clips to the grid; an empty polygon yields an empty set.
    pub fn query_polygon(&self, poly: &[Vec2]) -> FxHashSet<T> {
        let mut items = FxHashSet::default();

        if poly.is_empty() {
            return items;
        }

        let mut min_coord = IVec2::new(W as i32 - 1, H as i32 - 1);
        let mut max_coord = IVec2::new(0, 0);

        let n = poly.len();
        for i in 0..n {
            let p1 = poly[i];
            let p2 = poly[(i + 1) % n];

            for cell in self.cells_between_points(p1, p2) {
                if self.cell_in_range(cell) {
                    items.extend(self.cell(cell));
                }

                min_coord = min_coord.min(cell.max(IVec2::ZERO));
                max_coord = max_coord.max(cell.min(IVec2::new(W as i32 - 1, H as i32 - 1)));
            }
        }

        for i in min_coord.x..=max_coord.x {
            for j in min_coord.y..=max_coord.y {
                let centre = self.cell_centre(i as usize, j as usize);
                if point_is_inside_poly(centre, poly) {
                    items.extend(&self.cells[i as usize * H + j as usize]);
                }
            }
        }

        items
    }

    /// Rasterise the cells crossed by the segment `A → B` with a 2D DDA
    ///
    /// The start cell is always included. At each step the axis with the
    /// smaller parametric distance to its next grid line advances; on a tie
    /// the vertical (Y) axis steps first. Axis-aligned segments get `∞` on
    /// the missing axis, forcing all steps onto the other one. Returned
    /// cells are not clipped to the grid. Exposed for testing.
    pub fn cells_between_points(&self, a: Vec2, b: Vec2) -> GridCellList {
        let mut cells = GridCellList::default();

        let start_cell = self.world_to_grid(a);
        let end_cell = self.world_to_grid(b);

        cells.insert(start_cell);

        if start_cell == end_cell {
            return cells;
        }

        let step_x: i32 = if b.x > a.x { 1 } else { -1 };
        let step_y: i32 = if b.y > a.y { 1 } else { -1 };

        let delta = b - a;

        let next_vertical =
            self.world_min.x + self.cell_w * (start_cell.x + i32::from(step_x > 0)) as f32;
        let next_horizontal =
            self.world_min.y + self.cell_h * (start_cell.y + i32::from(step_y > 0)) as f32;

        let mut tx = if delta.x.abs() > 0.0 {
            (next_vertical - a.x) / delta.x
        } else {
            f32::MAX
        };

        let mut ty = if delta.y.abs() > 0.0 {
            (next_horizontal - a.y) / delta.y
        } else {
            f32::MAX
        };

        let dt_x = self.cell_w / delta.x.abs();
        let dt_y = self.cell_h / delta.y.abs();

        let mut cell = start_cell;

        while cell != end_cell {
            if tx < ty {
                cell.x += step_x;
                tx += dt_x;
            } else {
                cell.y += step_y;
                ty += dt_y;
            }

            cells.insert(cell);
        }

        cells
    }

    /// Grid coordinates of the cell containing `p` (unclipped)
    fn world_to_grid(&self, p: Vec2) -> IVec2 {
        IVec2::new(
            ((p.x - self.world_min.x) / self.cell_w).floor() as i32,
            ((p.y - self.world_min.y) / self.cell_h).floor() as i32,
        )
    }

    fn cell_in_range(&self, cell: IVec2) -> bool {
        cell.x >= 0 && cell.x < W as i32 && cell.y >= 0 && cell.y < H as i32
    }

    fn within_bounds(&self, p: Vec2) -> bool {
        p.x >= self.world_min.x
            && p.x <= self.world_max.x
            && p.y >= self.world_min.y
            && p.y <= self.world_max.y
    }

    fn cell_centre(&self, i: usize, j: usize) -> Vec2 {
        Vec2::new(
            self.world_min.x + (i as f32 + 0.5) * self.cell_w,
            self.world_min.y + (j as f32 + 0.5) * self.cell_h,
        )
    }

    fn cell(&self, cell: IVec2) -> &FxHashSet<T> {
        &self.cells[cell.x as usize * H + cell.y as usize]
    }

    fn cell_mut(&mut self, cell: IVec2) -> &mut FxHashSet<T> {
        &mut self.cells[cell.x as usize * H + cell.y as usize]
    }
}

#[cfg(test)]
#[path = "grid_tests.rs"]
mod tests;
