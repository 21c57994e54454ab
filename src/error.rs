//! Error type shared by all stages of the mortar evaluation.
use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// Library-wide error type.
///
/// Non-convergence of a single projection is not an error: it is reported as an infeasible
/// projection. The overlap detection turns it into [`Integration`](Self::Integration) where the
/// overlap cannot be built without it.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum MortarError {
    /// A precondition on the given element was violated.
    Usage { element: usize, message: String },
    /// The configuration is contradictory or unsupported for the problem at hand.
    Configuration(String),
    /// A recognised flag that is deliberately not supported.
    UnsupportedFlag(&'static str),
    /// An invariant of the segment integration was violated on the given slave element.
    Integration { element: usize, message: String },
    /// The biorthogonality system of the given slave element could not be inverted.
    SingularMatrix { element: usize },
    /// No quadrature rule is available for the requested cell.
    Quadrature(mortar_quadrature::Error),
}

impl MortarError {
    pub(crate) fn usage(element: usize, message: impl Into<String>) -> Self {
        Self::Usage {
            element,
            message: message.into(),
        }
    }

    pub(crate) fn integration(element: usize, message: impl Into<String>) -> Self {
        Self::Integration {
            element,
            message: message.into(),
        }
    }
}

impl Display for MortarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage { element, message } => write!(f, "Invalid usage on element {}: {}", element, message),
            Self::Configuration(message) => write!(f, "Invalid configuration: {}", message),
            Self::UnsupportedFlag(flag) => write!(f, "The flag `{}` is not supported.", flag),
            Self::Integration { element, message } => {
                write!(f, "Integration failed on slave element {}: {}", element, message)
            }
            Self::SingularMatrix { element } => write!(
                f,
                "Biorthogonality system of slave element {} is singular.",
                element
            ),
            Self::Quadrature(err) => write!(f, "Quadrature error: {}", err),
        }
    }
}

impl Error for MortarError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Quadrature(err) => Some(err),
            _ => None,
        }
    }
}

impl From<mortar_quadrature::Error> for MortarError {
    fn from(err: mortar_quadrature::Error) -> Self {
        Self::Quadrature(err)
    }
}
