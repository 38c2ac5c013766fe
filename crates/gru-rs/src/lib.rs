//! Operator front-end for recurrent GRU layers.
//!
//! An operator derives the shape of its outputs from input descriptors and parameters before
//! any kernel runs, owns a set of interchangeable kernel implementations (a vendor library call
//! and a generic kernel), and resolves exactly one of them as the active implementation the
//! executor invokes.

pub mod device;
mod env;
pub mod error;
pub mod ops;
pub mod params;
pub mod tensor;

pub use device::{Device, ExecutionContext, GruLaunch, HostDevice, SequenceLayout};
pub use error::{OpError, OpResult};
pub use ops::{
    Gru, ImplKind, Implementation, Operator, SelectionOverrides, SelectionPolicy, SelectionState,
};
pub use params::{Activation, GruParam};
pub use tensor::{DType, Layout, Shape, TensorDescriptor};
