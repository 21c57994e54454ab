use mortar_quadrature::integrate;
use mortar_quadrature::simplex::triangle_collapsed_gauss;
use matrixcompare::assert_scalar_eq;

fn factorial(n: i32) -> f64 {
    (1..=n).map(|k| k as f64).product()
}

/// Exact integral of `x^a y^b` over the unit triangle.
fn triangle_monomial_integral(a: i32, b: i32) -> f64 {
    factorial(a) * factorial(b) / factorial(a + b + 2)
}

#[test]
fn collapsed_gauss_integrates_monomials_exactly() {
    for n in 1..=8 {
        let rule = triangle_collapsed_gauss(n);
        assert_eq!(rule.0.len(), n * n);
        assert!(rule.0.iter().all(|&w| w > 0.0));

        let max_degree = 2 * n as i32 - 2;
        for a in 0..=max_degree {
            for b in 0..=(max_degree - a) {
                let estimated = integrate(&rule, |&[x, y]| x.powi(a) * y.powi(b));
                assert_scalar_eq!(estimated, triangle_monomial_integral(a, b), comp = abs, tol = 1e-14);
            }
        }
    }
}

#[test]
fn collapsed_gauss_points_lie_inside_triangle() {
    let (_, points) = triangle_collapsed_gauss(6);
    for [x, y] in points {
        assert!(x > 0.0 && y > 0.0 && x + y < 1.0);
    }
}
