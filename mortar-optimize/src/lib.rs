/// Calculus helper traits and numerical differentiation
pub mod calculus;
/// Newton's method for small nonlinear systems
pub mod newton;
