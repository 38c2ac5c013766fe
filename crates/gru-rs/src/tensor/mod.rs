//! Tensor descriptors consumed by operators.
//!
//! Descriptors carry extents, dtype, and layout only; storage and device memory are owned by
//! the surrounding framework. Operators read descriptors by reference and write output extents
//! through [`TensorDescriptor::set_shape`].

mod descriptor;
pub mod dtype;
pub mod layout;
pub mod shape;

pub use descriptor::TensorDescriptor;
pub use dtype::DType;
pub use layout::Layout;
pub use shape::Shape;
