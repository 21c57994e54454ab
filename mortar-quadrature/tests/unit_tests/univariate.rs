use super::monomial_integral_1d;
use mortar_quadrature::univariate::{gauss, try_gauss};
use mortar_quadrature::{gauss_points_for_degree, integrate, Error};

use matrixcompare::assert_scalar_eq;

#[test]
fn gauss_rules_satisfy_expected_accuracy() {
    for n in 1..=40 {
        let expected_polynomial_degree = 2 * n - 1;
        let rule = gauss(n);

        assert!(rule.0.iter().all(|&w| w > 0.0));

        for alpha in 0..=expected_polynomial_degree as i32 {
            let estimated_integral = integrate(&rule, |x| x[0].powi(alpha));
            assert_scalar_eq!(estimated_integral, monomial_integral_1d(alpha), comp = abs, tol = 1e-14);
        }
    }
}

#[test]
fn try_gauss_rejects_empty_rule() {
    assert_eq!(try_gauss(0), Err(Error::NoRuleAvailable));
    assert!(try_gauss(3).is_ok());
}

#[test]
fn gauss_points_for_degree_is_minimal() {
    for degree in 0..20 {
        let n = gauss_points_for_degree(degree);
        assert!(2 * n - 1 >= degree);
        assert!(n == 1 || 2 * (n - 1) - 1 < degree);
    }
}
