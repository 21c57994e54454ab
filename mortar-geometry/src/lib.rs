//! Planar geometry used to segment mortar interfaces.
//!
//! All routines operate in a two-dimensional parameter space, typically the reference domain
//! of a slave surface element.

pub mod clip;
pub mod polygon;

#[cfg(feature = "proptest")]
pub mod proptest_strategies;

pub use clip::*;
pub use polygon::*;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Orientation {
    Clockwise,
    Counterclockwise,
}
