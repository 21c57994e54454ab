//! Mortar coupling of non-matching surface meshes.
//!
//! The crate evaluates the discrete mortar operators of a slave/master interface: the slave
//! matrix `D`, the mortar matrix `M`, the weighted gap and, in contact mode, weighted contact
//! pressures and tractions, all together with their directional derivatives with respect to the
//! nodal coordinates.
//!
//! The evaluation proceeds element by element on the slave side:
//!
//! - [`element`]: shape functions and geometry of surface elements,
//! - [`projector`]: projection of points onto elements along the interpolated nodal normal,
//! - [`overlap`]: segmentation of slave/master pairs into integration cells,
//! - [`dual`]: biorthogonal Lagrange multiplier bases,
//! - [`integrate`]: numerical integration of the operators on the cells,
//! - [`coupling`]: the [`Interface`](coupling::Interface) driving the above,
//! - [`assembly`]: summation of element contributions into global sparse operators.

pub mod assembly;
pub mod config;
pub mod contact;
pub mod coupling;
pub mod dual;
pub mod element;
pub mod error;
pub mod integrate;
pub mod mesh;
pub mod overlap;
pub mod paired;
pub mod projector;
pub mod quadrature;

#[cfg(feature = "proptest")]
pub mod proptest;

pub mod geometry {
    pub use mortar_geometry::*;
}

pub mod optimize {
    pub use mortar_optimize::*;
}

pub use mortar_traits::Real;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;
