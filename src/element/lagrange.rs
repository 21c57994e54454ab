use super::{CellType, ShapeFunctions};
use mortar_traits::Real;
use nalgebra::Vector2;
use numeric_literals::replace_float_literals;

/// Value, first and second derivative of a univariate basis function.
type Univariate<T> = (T, T, T);

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn line2_1d<T: Real>(x: T) -> [Univariate<T>; 2] {
    [((1.0 - x) / 2.0, -0.5, 0.0), ((1.0 + x) / 2.0, 0.5, 0.0)]
}

/// Quadratic Lagrange polynomials with nodes ordered `-1, 1, 0`.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn line3_1d<T: Real>(x: T) -> [Univariate<T>; 3] {
    [
        (x * (x - 1.0) / 2.0, x - 0.5, 1.0),
        (x * (x + 1.0) / 2.0, x + 0.5, 1.0),
        (1.0 - x * x, -2.0 * x, -2.0),
    ]
}

/// Position of the 1D node at coordinate `-1`, `1` or `0` in [`line3_1d`].
fn line3_index<T: Real>(coord: T) -> usize {
    if coord < T::zero() {
        0
    } else if coord > T::zero() {
        1
    } else {
        2
    }
}

pub(super) fn evaluate<T: Real>(cell: CellType, xi: &Vector2<T>) -> ShapeFunctions<T> {
    let mut sf = ShapeFunctions::zeros(cell.num_nodes());
    match cell {
        CellType::Line2 => fill_line(&mut sf, &line2_1d(xi.x)),
        CellType::Line3 => fill_line(&mut sf, &line3_1d(xi.x)),
        CellType::Tri3 => tri3(&mut sf, xi),
        CellType::Tri6 => tri6(&mut sf, xi),
        CellType::Quad4 => quad4(&mut sf, xi),
        CellType::Quad8 => quad8(&mut sf, xi),
        CellType::Quad9 => quad9(&mut sf, xi),
        _ => panic!("{:?} is not a Lagrange cell", cell),
    }
    sf
}

fn fill_line<T: Real>(sf: &mut ShapeFunctions<T>, funcs: &[Univariate<T>]) {
    for (k, &(n, dn, ddn)) in funcs.iter().enumerate() {
        sf.values[k] = n;
        sf.gradients[(0, k)] = dn;
        sf.hessians[(0, k)] = ddn;
    }
}

fn set<T: Real>(sf: &mut ShapeFunctions<T>, k: usize, value: T, gradient: Vector2<T>, hessian: [T; 3]) {
    sf.values[k] = value;
    sf.gradients.set_column(k, &gradient);
    for (row, h) in hessian.into_iter().enumerate() {
        sf.hessians[(row, k)] = h;
    }
}

/// Barycentric coordinates of the unit triangle and their (constant) gradients.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn barycentric<T: Real>(xi: &Vector2<T>) -> ([T; 3], [Vector2<T>; 3]) {
    (
        [1.0 - xi.x - xi.y, xi.x, xi.y],
        [Vector2::new(-1.0, -1.0), Vector2::new(1.0, 0.0), Vector2::new(0.0, 1.0)],
    )
}

fn tri3<T: Real>(sf: &mut ShapeFunctions<T>, xi: &Vector2<T>) {
    let (l, dl) = barycentric(xi);
    for k in 0..3 {
        set(sf, k, l[k], dl[k], [T::zero(); 3]);
    }
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn tri6<T: Real>(sf: &mut ShapeFunctions<T>, xi: &Vector2<T>) {
    let (l, dl) = barycentric(xi);
    for i in 0..3 {
        let a = dl[i];
        let value = l[i] * (2.0 * l[i] - 1.0);
        let gradient = a * (4.0 * l[i] - 1.0);
        set(sf, i, value, gradient, [4.0 * a.x * a.x, 4.0 * a.y * a.y, 4.0 * a.x * a.y]);
    }
    for (k, (i, j)) in [(3, (0, 1)), (4, (1, 2)), (5, (2, 0))] {
        let (a, b) = (dl[i], dl[j]);
        let value = 4.0 * l[i] * l[j];
        let gradient = (a * l[j] + b * l[i]) * 4.0;
        let hessian = [8.0 * a.x * b.x, 8.0 * a.y * b.y, 4.0 * (a.x * b.y + a.y * b.x)];
        set(sf, k, value, gradient, hessian);
    }
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn quad4<T: Real>(sf: &mut ShapeFunctions<T>, xi: &Vector2<T>) {
    let (x, y) = (xi.x, xi.y);
    for k in 0..4 {
        let node = CellType::Quad4.node_parametric_coords::<T>(k);
        let (a, b) = (node.x, node.y);
        let value = 0.25 * (1.0 + a * x) * (1.0 + b * y);
        let gradient = Vector2::new(0.25 * a * (1.0 + b * y), 0.25 * b * (1.0 + a * x));
        set(sf, k, value, gradient, [0.0, 0.0, 0.25 * a * b]);
    }
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn quad8<T: Real>(sf: &mut ShapeFunctions<T>, xi: &Vector2<T>) {
    let (x, y) = (xi.x, xi.y);
    for k in 0..8 {
        let node = CellType::Quad8.node_parametric_coords::<T>(k);
        let (a, b) = (node.x, node.y);
        if k < 4 {
            let (p, q) = (1.0 + a * x, 1.0 + b * y);
            let value = 0.25 * p * q * (a * x + b * y - 1.0);
            let gradient = Vector2::new(
                0.25 * a * q * (2.0 * a * x + b * y),
                0.25 * b * p * (a * x + 2.0 * b * y),
            );
            let hessian = [0.5 * q, 0.5 * p, 0.25 * a * b * (2.0 * a * x + 2.0 * b * y + 1.0)];
            set(sf, k, value, gradient, hessian);
        } else if a == T::zero() {
            let q = 1.0 + b * y;
            let value = 0.5 * (1.0 - x * x) * q;
            let gradient = Vector2::new(-x * q, 0.5 * b * (1.0 - x * x));
            set(sf, k, value, gradient, [-q, 0.0, -x * b]);
        } else {
            let p = 1.0 + a * x;
            let value = 0.5 * p * (1.0 - y * y);
            let gradient = Vector2::new(0.5 * a * (1.0 - y * y), -y * p);
            set(sf, k, value, gradient, [0.0, -p, -y * a]);
        }
    }
}

fn quad9<T: Real>(sf: &mut ShapeFunctions<T>, xi: &Vector2<T>) {
    let fx = line3_1d(xi.x);
    let fy = line3_1d(xi.y);
    for k in 0..9 {
        let node = CellType::Quad9.node_parametric_coords::<T>(k);
        let (f, df, ddf) = fx[line3_index(node.x)];
        let (g, dg, ddg) = fy[line3_index(node.y)];
        set(sf, k, f * g, Vector2::new(df * g, f * dg), [ddf * g, f * ddg, df * dg]);
    }
}
