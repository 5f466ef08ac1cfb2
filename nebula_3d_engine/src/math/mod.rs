/// Math primitives for the engine core.
///
/// Vectors and matrices come from `glam`; this module adds the geometric
/// primitives the runtime systems are built on: infinite lines and segments,
/// polygon tests, ear-clipping triangulation and the view/projection
/// matrices used by the renderer.

// Lines, segments, projections and circle intersection
pub mod line;

// Point-in-polygon and triangulation
pub mod polygon;

// Perspective/view matrices and small transform helpers
pub mod view;

pub use line::*;
pub use polygon::*;
pub use view::*;
