//! Infinite lines and line segments in the XZ plane.

use glam::Vec2;

/// An infinite 2D line in implicit form `ax + by + c = 0`
#[derive(Debug, Clone, Copy)]
pub struct Line {
    pub a: f32,
    pub b: f32,
    pub c: f32,
}

impl Line {
    /// Construct from coefficients
    pub fn new(a: f32, b: f32, c: f32) -> Self {
        Self { a, b, c }
    }

    /// Construct the line through two points
    pub fn through(p: Vec2, q: Vec2) -> Self {
        Self {
            a: q.y - p.y,
            b: p.x - q.x,
            c: q.x * p.y - p.x * q.y,
        }
    }
}

/// A 2D line segment between two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub a: Vec2,
    pub b: Vec2,
}

impl LineSegment {
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }
}

/// Intersection point of two lines, or `None` if they are parallel
pub fn line_intersect(l1: &Line, l2: &Line) -> Option<Vec2> {
    let det = l1.a * l2.b - l1.b * l2.a;
    if det == 0.0 {
        return None;
    }
    Some(Vec2::new(
        (l1.b * l2.c - l1.c * l2.b) / det,
        (l1.c * l2.a - l1.a * l2.c) / det,
    ))
}

/// Foot of the perpendicular from `p` onto `line`
///
/// Closed-form projection; the denominator `a² + b²` is non-zero for any
/// line constructed from two distinct points.
pub fn projection_onto_line(line: &Line, p: Vec2) -> Vec2 {
    let d = (line.a * p.x + line.b * p.y + line.c) / (line.a * line.a + line.b * line.b);
    Vec2::new(p.x - line.a * d, p.y - line.b * d)
}

/// Whether the segment intersects the circle `(centre, radius)`
///
/// Solves `|A + t(B − A) − centre|² = radius²` and reports true iff either
/// root lies in `[0, 1]`. A circle that fully contains the segment does not
/// intersect it.
pub fn line_segment_circle_intersect(seg: &LineSegment, centre: Vec2, radius: f32) -> bool {
    let d = seg.b - seg.a;
    let alpha = d.x * d.x + d.y * d.y;
    let beta = 2.0 * (d.x * (seg.a.x - centre.x) + d.y * (seg.a.y - centre.y));
    let gamma = (seg.a.x - centre.x) * (seg.a.x - centre.x)
        + (seg.a.y - centre.y) * (seg.a.y - centre.y)
        - radius * radius;

    let discriminant = beta * beta - 4.0 * alpha * gamma;
    if discriminant < 0.0 {
        return false;
    }

    let root = discriminant.sqrt();

    let t = (-beta + root) / (2.0 * alpha);
    if (0.0..=1.0).contains(&t) {
        return true;
    }

    let t = (-beta - root) / (2.0 * alpha);
    (0.0..=1.0).contains(&t)
}

#[cfg(test)]
#[path = "line_tests.rs"]
mod tests;
