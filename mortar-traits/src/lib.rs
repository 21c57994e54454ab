use nalgebra::RealField;

pub use nalgebra;

/// Scalar type used throughout the mortar crates.
///
/// Trait alias for `RealField + Copy`, so that scalars can be passed by value in the
/// element kernels without cloning.
pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}
