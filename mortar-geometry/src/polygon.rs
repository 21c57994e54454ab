use crate::Orientation;
use itertools::Itertools;
use mortar_traits::Real;
use nalgebra::{Point2, Scalar, Vector2};
use numeric_literals::replace_float_literals;

/// A simple polygon in the plane, given by its vertices in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimplePolygon2d<T: Scalar> {
    vertices: Vec<Point2<T>>,
}

/// Two-dimensional cross product (z-component of the 3D cross product).
pub fn cross2<T: Real>(a: &Vector2<T>, b: &Vector2<T>) -> T {
    a.x * b.y - a.y * b.x
}

impl<T: Scalar> SimplePolygon2d<T> {
    pub fn from_vertices(vertices: Vec<Point2<T>>) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Point2<T>] {
        &self.vertices
    }

    pub fn into_vertices(self) -> Vec<Point2<T>> {
        self.vertices
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }
}

impl<T: Real> SimplePolygon2d<T> {
    /// Computes the signed area of the polygon.
    ///
    /// Positive for counter-clockwise orientation, negative for clockwise.
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn signed_area(&self) -> T {
        // Shoelace formula, i.e. Green's theorem applied edge by edge
        let mut area = T::zero();
        for (a, b) in self.vertices.iter().circular_tuple_windows() {
            area += (b.y - a.y) * (b.x + a.x);
        }
        area * 0.5
    }

    pub fn area(&self) -> T {
        self.signed_area().abs()
    }

    pub fn orientation(&self) -> Orientation {
        if self.signed_area() > T::zero() {
            Orientation::Counterclockwise
        } else {
            Orientation::Clockwise
        }
    }

    /// Returns the polygon with counter-clockwise orientation, together with the permutation
    /// mapping new vertex positions to the original vertex indices.
    pub fn to_counterclockwise(&self) -> (Self, Vec<usize>) {
        let n = self.vertices.len();
        match self.orientation() {
            Orientation::Counterclockwise => (self.clone(), (0..n).collect()),
            Orientation::Clockwise => {
                let permutation: Vec<usize> = (0..n).rev().collect();
                let vertices = permutation.iter().map(|&i| self.vertices[i]).collect();
                (Self::from_vertices(vertices), permutation)
            }
        }
    }

    /// Determines whether the polygon is convex and counter-clockwise oriented.
    ///
    /// Every pair of consecutive edges must turn left, up to the given tolerance on the
    /// two-dimensional cross product. Polygons with fewer than three vertices are not convex.
    pub fn is_convex_counterclockwise(&self, tol: T) -> bool {
        if self.vertices.len() < 3 {
            return false;
        }
        self.vertices
            .iter()
            .circular_tuple_windows()
            .all(|(a, b, c)| cross2(&(b - a), &(c - b)) >= -tol)
            && self.signed_area() > T::zero()
    }

    /// The arithmetic mean of the vertices.
    pub fn vertex_average(&self) -> Point2<T> {
        let n: T = nalgebra::convert(self.vertices.len() as f64);
        let sum = self
            .vertices
            .iter()
            .fold(Vector2::zeros(), |acc, v| acc + v.coords);
        Point2::from(sum / n)
    }
}

/// Signed area of the triangle `abc`, positive if counter-clockwise.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn triangle_signed_area<T: Real>(a: &Point2<T>, b: &Point2<T>, c: &Point2<T>) -> T {
    0.5 * cross2(&(b - a), &(c - a))
}
