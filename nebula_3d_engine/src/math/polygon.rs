//! Point-in-polygon testing and ear-clipping triangulation.
//!
//! Polygons are ordered vertex lists with an implicit closing edge. The
//! runtime treats the XZ plane as the ground plane, so triangulation takes
//! 3D vertices and works on their X and Z components.

use glam::{Vec2, Vec3};
use crate::error::{Error, Result};

/// Crossing-number point-in-polygon test
///
/// Edges are treated as half-open in Y (`(y1 > py) != (y2 > py)`), which
/// makes shared edges between adjacent polygons count exactly once. Points
/// on a vertical-crossing edge to the right of `p` toggle the result.
pub fn point_is_inside_poly(p: Vec2, poly: &[Vec2]) -> bool {
    let mut inside = false;
    let n = poly.len();

    for i in 0..n {
        let Vec2 { x: x1, y: y1 } = poly[i];
        let Vec2 { x: x2, y: y2 } = poly[(i + 1) % n];

        if (y1 > p.y) != (y2 > p.y) {
            let x_intersect = x1 + (p.y - y1) * (x2 - x1) / (y2 - y1);
            if x_intersect > p.x {
                inside = !inside;
            }
        }
    }

    inside
}

/// Triangulate a polygon in the XZ plane by ear clipping
///
/// The polygon must be wound anticlockwise when viewed from above (+Y).
/// Returns `n − 2` triangles as index triples into `vertices`.
///
/// # Errors
///
/// `DegeneratePolygon` if there are fewer than 3 vertices, or if no ear can
/// be clipped (self-intersecting or fully collinear input).
pub fn triangulate_poly(vertices: &[Vec3]) -> Result<Vec<u16>> {
    if vertices.len() < 3 {
        return Err(Error::DegeneratePolygon(format!(
            "cannot triangulate polygon with {} vertices",
            vertices.len()
        )));
    }

    // Anticlockwise test on the XZ components (positive doubled signed area)
    let anticlockwise = |a: Vec3, b: Vec3, c: Vec3| {
        a.x * b.z - a.z * b.x + a.z * c.x - a.x * c.z + b.x * c.z - c.x * b.z > 0.0
    };

    // Strict point-in-triangle test; boundary points count as outside, so
    // collinear neighbours do not block an ear.
    let point_in_triangle = |p: Vec3, a: Vec3, b: Vec3, c: Vec3| {
        let q = 0.5 * (-b.z * c.x + a.z * (-b.x + c.x) + a.x * (b.z - c.z) + b.x * c.z);
        let sign = if q < 0.0 { -1.0 } else { 1.0 };
        let s = (a.z * c.x - a.x * c.z + (c.z - a.z) * p.x + (a.x - c.x) * p.z) * sign;
        let t = (a.x * b.z - a.z * b.x + (a.z - b.z) * p.x + (b.x - a.x) * p.z) * sign;
        s > 0.0 && t > 0.0 && (s + t) < 2.0 * q * sign
    };

    let mut indices: Vec<u16> = Vec::with_capacity((vertices.len() - 2) * 3);
    let mut poly: Vec<u16> = (0..vertices.len() as u16).collect();

    let is_ear = |poly: &[u16], idx_a: u16, idx_b: u16, idx_c: u16| {
        let (a, b, c) = (
            vertices[idx_a as usize],
            vertices[idx_b as usize],
            vertices[idx_c as usize],
        );
        if !anticlockwise(a, b, c) {
            return false;
        }
        poly.iter()
            .filter(|&&i| i != idx_a && i != idx_b && i != idx_c)
            .all(|&i| !point_in_triangle(vertices[i as usize], a, b, c))
    };

    while poly.len() > 3 {
        let mut clipped = false;

        for i in 1..poly.len() {
            let idx_a = poly[i - 1];
            let idx_b = poly[i];
            let idx_c = poly[(i + 1) % poly.len()];

            if is_ear(&poly, idx_a, idx_b, idx_c) {
                indices.extend_from_slice(&[idx_a, idx_b, idx_c]);
                poly.remove(i);
                clipped = true;
                break;
            }
        }

        if !clipped {
            return Err(Error::DegeneratePolygon(
                "no ear found during triangulation".to_string(),
            ));
        }
    }

    indices.extend_from_slice(&poly);

    Ok(indices)
}

#[cfg(test)]
#[path = "polygon_tests.rs"]
mod tests;
