/// Poor man's approx assertion for matrices
#[macro_export]
macro_rules! assert_approx_matrix_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let diff = $x - $y;

        let max_absdiff = diff.abs().max();
        let approx_eq = max_absdiff <= $tol;

        if !approx_eq {
            println!("abstol: {:e}", $tol);
            println!("left: {}", $x);
            println!("right: {}", $y);
            println!("diff: {:e}", diff);
        }
        assert!(approx_eq);
    }};
}

#[macro_export]
macro_rules! assert_panics {
    ($e:expr) => {{
        use std::panic::catch_unwind;
        use std::stringify;
        let expr_string = stringify!($e);
        let result = catch_unwind(|| $e);
        if result.is_ok() {
            panic!("assert_panics!({}) failed.", expr_string);
        }
    }};
}

/// Approx assertion for scalars relative to a reference magnitude.
///
/// Passes if `|x - y| <= reltol * max(scale, 1)`.
#[macro_export]
macro_rules! assert_approx_scalar_eq {
    ($x:expr, $y:expr, reltol = $tol:expr, scale = $scale:expr) => {{
        let (x, y): (f64, f64) = ($x, $y);
        let bound = $tol * f64::max($scale, 1.0);
        if (x - y).abs() > bound {
            panic!(
                "assertion failed: |{:e} - {:e}| = {:e} > {:e}",
                x,
                y,
                (x - y).abs(),
                bound
            );
        }
    }};
}
