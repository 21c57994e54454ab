//! Sutherland-Hodgman clipping of convex polygons with vertex provenance.
//!
//! Mortar segmentation needs to know, for every vertex of a clipped polygon, which geometric
//! entities it was constructed from: the linearisation of a vertex that is a projected master
//! node differs from one that is a slave corner or an edge-edge intersection. The clipper
//! therefore tracks, for every edge of the intermediate polygons, the line that supports it.

use crate::polygon::cross2;
use mortar_traits::Real;
use nalgebra::{Point2, Scalar};
use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// Origin of a vertex of a clipped polygon.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ClipVertexKind {
    /// The vertex is the given vertex of the subject polygon.
    Subject(usize),
    /// The vertex is the given vertex of the clip polygon.
    Clip(usize),
    /// Intersection of the subject edge `(s_i, s_{i+1})` with the clip edge `(c_j, c_{j+1})`.
    Intersection { subject_edge: usize, clip_edge: usize },
}

impl ClipVertexKind {
    fn priority(&self) -> u8 {
        match self {
            Self::Subject(_) | Self::Clip(_) => 1,
            Self::Intersection { .. } => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClipVertex<T: Scalar> {
    pub point: Point2<T>,
    pub kind: ClipVertexKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClipError {
    /// Fewer than three vertices were provided for one of the polygons.
    InvalidPolygon,
    /// Two non-adjacent clip edges intersect in the result, which only happens when the
    /// clip polygon is degenerate or not convex.
    DegenerateIntersection { first_edge: usize, second_edge: usize },
}

impl Display for ClipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPolygon => write!(f, "Polygons must have at least three vertices."),
            Self::DegenerateIntersection {
                first_edge,
                second_edge,
            } => write!(
                f,
                "Non-adjacent clip edges {} and {} intersect in the clipped polygon.",
                first_edge, second_edge
            ),
        }
    }
}

impl Error for ClipError {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Support {
    Subject(usize),
    Clip(usize),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum WorkingKind {
    Final(ClipVertexKind),
    ClipLines(usize, usize),
}

#[derive(Debug, Clone)]
struct WorkingVertex<T: Scalar> {
    point: Point2<T>,
    kind: WorkingKind,
    /// Line supporting the edge from this vertex to its successor.
    next_edge: Support,
}

/// Intersection of two clip lines, resolved to the clip vertex they share if they are adjacent.
fn clip_lines_kind(first: usize, second: usize, num_clip_vertices: usize) -> WorkingKind {
    let m = num_clip_vertices;
    if (first + 1) % m == second {
        WorkingKind::Final(ClipVertexKind::Clip(second))
    } else if (second + 1) % m == first {
        WorkingKind::Final(ClipVertexKind::Clip(first))
    } else {
        WorkingKind::ClipLines(first, second)
    }
}

/// Clips the convex `subject` polygon against the convex `clip` polygon.
///
/// Both polygons must be oriented counter-clockwise. A point is considered inside a clip edge
/// if its signed distance to the edge line is at least `-tol`. Consecutive vertices closer than
/// `tol` are merged, preferring subject or clip vertices over intersections. If the clipped
/// polygon has fewer than three vertices, an empty polygon is returned.
pub fn clip_convex_polygons<T: Real>(
    subject: &[Point2<T>],
    clip: &[Point2<T>],
    tol: T,
) -> Result<Vec<ClipVertex<T>>, ClipError> {
    if subject.len() < 3 || clip.len() < 3 {
        return Err(ClipError::InvalidPolygon);
    }

    let m = clip.len();
    let mut polygon: Vec<_> = subject
        .iter()
        .enumerate()
        .map(|(i, p)| WorkingVertex {
            point: *p,
            kind: WorkingKind::Final(ClipVertexKind::Subject(i)),
            next_edge: Support::Subject(i),
        })
        .collect();

    for j in 0..m {
        if polygon.is_empty() {
            break;
        }
        let a = clip[j];
        let edge = clip[(j + 1) % m] - a;
        let edge_length = edge.norm();
        let distance = |p: &Point2<T>| cross2(&edge, &(p - a)) / edge_length;

        let intersect = |current: &WorkingVertex<T>, next: &WorkingVertex<T>, dc: T, dn: T, next_edge: Support| {
            let t = (dc / (dc - dn)).max(T::zero()).min(T::one());
            let point = current.point + (next.point - current.point) * t;
            let kind = match current.next_edge {
                Support::Subject(i) => WorkingKind::Final(ClipVertexKind::Intersection {
                    subject_edge: i,
                    clip_edge: j,
                }),
                Support::Clip(other) => clip_lines_kind(other, j, m),
            };
            WorkingVertex { point, kind, next_edge }
        };

        let n = polygon.len();
        let mut output = Vec::with_capacity(n + 1);
        for k in 0..n {
            let current = &polygon[k];
            let next = &polygon[(k + 1) % n];
            let dc = distance(&current.point);
            let dn = distance(&next.point);
            match (dc >= -tol, dn >= -tol) {
                (true, true) => output.push(next.clone()),
                (true, false) => output.push(intersect(current, next, dc, dn, Support::Clip(j))),
                (false, true) => {
                    output.push(intersect(current, next, dc, dn, current.next_edge));
                    output.push(next.clone());
                }
                (false, false) => {}
            }
        }
        polygon = output;
    }

    let polygon = merge_close_vertices(polygon, tol);
    if polygon.len() < 3 {
        return Ok(Vec::new());
    }

    polygon
        .into_iter()
        .map(|v| match v.kind {
            WorkingKind::Final(kind) => Ok(ClipVertex { point: v.point, kind }),
            WorkingKind::ClipLines(first_edge, second_edge) => {
                // Non-adjacent clip lines may only meet at a clip vertex of a degenerate polygon
                clip.iter()
                    .position(|c| (c - v.point).norm() <= tol)
                    .map(|idx| ClipVertex {
                        point: v.point,
                        kind: ClipVertexKind::Clip(idx),
                    })
                    .ok_or(ClipError::DegenerateIntersection {
                        first_edge,
                        second_edge,
                    })
            }
        })
        .collect()
}

fn working_priority<T: Scalar>(v: &WorkingVertex<T>) -> u8 {
    match v.kind {
        WorkingKind::Final(kind) => kind.priority(),
        WorkingKind::ClipLines(..) => 0,
    }
}

fn merge_close_vertices<T: Real>(polygon: Vec<WorkingVertex<T>>, tol: T) -> Vec<WorkingVertex<T>> {
    let mut merged: Vec<WorkingVertex<T>> = Vec::with_capacity(polygon.len());
    for vertex in polygon {
        match merged.last_mut() {
            Some(last) if (last.point - vertex.point).norm() <= tol => {
                if working_priority(&vertex) > working_priority(last) {
                    *last = vertex;
                }
            }
            _ => merged.push(vertex),
        }
    }
    // Wrap-around duplicate
    while merged.len() > 1 {
        let n = merged.len();
        if (merged[0].point - merged[n - 1].point).norm() > tol {
            break;
        }
        if let Some(last) = merged.pop() {
            if working_priority(&last) > working_priority(&merged[0]) {
                merged[0] = last;
            }
        }
    }
    merged
}
