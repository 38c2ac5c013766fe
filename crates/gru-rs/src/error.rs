//! Status values returned by operators, implementations, and devices.

use thiserror::Error;

use crate::ops::ImplKind;

/// Failure conditions surfaced to the graph builder.
///
/// None of these abort the process; they describe graph-construction or configuration
/// mistakes that the caller reports upward.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OpError {
    #[error("invalid shape: {0}")]
    InvalidShape(String),
    #[error("implementation kind '{0}' is not supported by this operator")]
    UnsupportedImplementation(ImplKind),
    #[error("no '{0}' implementation has been registered")]
    ImplementationNotRegistered(ImplKind),
    #[error("output shape has not been inferred yet")]
    ShapeNotReady,
    #[error("operator has no registered implementation candidates")]
    NoCandidates,
    #[error("no implementation has been selected")]
    NotSelected,
    #[error("invalid parameter: {0}")]
    InvalidParam(String),
    #[error("device error: {0}")]
    Device(String),
}

impl OpError {
    pub fn invalid_shape(detail: impl Into<String>) -> Self {
        OpError::InvalidShape(detail.into())
    }

    pub fn invalid_param(detail: impl Into<String>) -> Self {
        OpError::InvalidParam(detail.into())
    }

    pub fn device(detail: impl Into<String>) -> Self {
        OpError::Device(detail.into())
    }
}

pub type OpResult<T> = Result<T, OpError>;
