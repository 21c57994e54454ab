//! Interface to the constitutive law of contact mode.
//!
//! The core evaluates the normal gap and the tangential relative displacement at every Gauss
//! point and hands them to a [`ContactLaw`]. The law returns pressure and traction together with
//! their partial derivatives, which the integrator chains with the kinematic linearisation.
use crate::paired::PairedVector;
use mortar_traits::Real;
use nalgebra::{Matrix3, Scalar, Vector3};

/// Kinematic state at a Gauss point.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ContactState<T: Scalar> {
    /// Normal gap `(x_m - x_s) · n`, positive for separated surfaces.
    pub gap: T,
    /// Tangential relative displacement `(I - n n^T)(u_m - u_s)`.
    pub slip: Vector3<T>,
    /// Unit slave normal at the Gauss point.
    pub normal: Vector3<T>,
}

/// Response of a contact law with partial derivatives with respect to gap and slip.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ContactResponse<T: Scalar> {
    pub pressure: T,
    pub traction: Vector3<T>,
    pub pressure_gap: T,
    pub pressure_slip: Vector3<T>,
    pub traction_gap: Vector3<T>,
    pub traction_slip: Matrix3<T>,
}

pub trait ContactLaw<T: Real>: Send + Sync {
    fn evaluate(&self, state: &ContactState<T>) -> ContactResponse<T>;
}

/// Weighted pressure and traction of one slave node.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactContribution<T: Scalar> {
    /// `∫ Λ_i p dΓ`.
    pub pressure: T,
    /// `∫ Λ_i t dΓ`.
    pub traction: Vector3<T>,
    pub pressure_deriv: PairedVector<T>,
    pub traction_deriv: PairedVector<Vector3<T>>,
}

impl<T: Real> Default for ContactContribution<T> {
    fn default() -> Self {
        Self {
            pressure: T::zero(),
            traction: Vector3::zeros(),
            pressure_deriv: PairedVector::new(),
            traction_deriv: PairedVector::new(),
        }
    }
}
