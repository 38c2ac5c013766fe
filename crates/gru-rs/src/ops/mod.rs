//! Operators and the machinery for registering and selecting their implementations.

pub mod gru;
pub mod implementation;
pub mod operator;
pub mod policy;
pub mod registry;

pub use gru::{GenericGru, Gru, VendorGru, GRU_OP_KEY, MAX_SEQ_SUM};
pub use implementation::{ImplKind, Implementation};
pub use operator::{Operator, OperatorCore, SelectionState};
pub use policy::{PolicyParseError, SelectionOverrides, SelectionPolicy};
pub use registry::ImplementationRegistry;
