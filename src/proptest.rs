//! Strategies for property-based testing of the element kernel.
use crate::element::CellType;
use ::proptest::prelude::*;
use nalgebra::Vector2;

/// Any Lagrange surface cell type.
pub fn lagrange_cell_type() -> impl Strategy<Value = CellType> {
    use CellType::*;
    prop_oneof![
        Just(Line2),
        Just(Line3),
        Just(Tri3),
        Just(Tri6),
        Just(Quad4),
        Just(Quad8),
        Just(Quad9)
    ]
}

/// A point in the closed reference domain of `cell`.
pub fn reference_point(cell: CellType) -> impl Strategy<Value = Vector2<f64>> {
    let unit = 0.0..=1.0;
    let range = -1.0..=1.0;
    if cell.is_triangle() {
        // Fold the unit square onto the triangle
        [unit.clone(), unit]
            .prop_map(|[x, y]| {
                if x + y > 1.0 {
                    Vector2::new(1.0 - x, 1.0 - y)
                } else {
                    Vector2::new(x, y)
                }
            })
            .boxed()
    } else if cell.parametric_dim() == 1 {
        range.prop_map(|x| Vector2::new(x, 0.0)).boxed()
    } else {
        [range.clone(), range].prop_map(|[x, y]| Vector2::new(x, y)).boxed()
    }
}

/// A cell type together with a point in its reference domain.
pub fn lagrange_cell_and_point() -> impl Strategy<Value = (CellType, Vector2<f64>)> {
    lagrange_cell_type().prop_flat_map(|cell| (Just(cell), reference_point(cell)))
}
