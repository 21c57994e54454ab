use crate::SimplePolygon2d;
use nalgebra::Point2;
use proptest::prelude::*;
use std::f64::consts::PI;

/// Convex, counter-clockwise polygons with vertices on a circle.
///
/// Consecutive vertices are separated by an angle of at least `PI / 8`, which keeps the
/// polygons away from degenerate configurations.
pub fn convex_polygon_strategy(max_vertices: usize) -> impl Strategy<Value = SimplePolygon2d<f64>> {
    assert!(max_vertices >= 3);
    let center = (-1.0..1.0, -1.0..1.0);
    let radius = 0.2..2.0;
    let angles = proptest::collection::vec(0.0..2.0 * PI, 3..=max_vertices);
    (center, radius, angles).prop_filter_map("vertices too close", |((cx, cy), r, mut angles)| {
        angles.sort_by(|a, b| a.total_cmp(b));
        let n = angles.len();
        let well_separated = (0..n).all(|i| {
            let next = if i + 1 < n { angles[i + 1] } else { angles[0] + 2.0 * PI };
            next - angles[i] >= PI / 8.0
        });
        well_separated.then(|| {
            let vertices = angles
                .iter()
                .map(|theta| Point2::new(cx + r * theta.cos(), cy + r * theta.sin()))
                .collect();
            SimplePolygon2d::from_vertices(vertices)
        })
    })
}
