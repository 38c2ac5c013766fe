use crate::error::{OpError, OpResult};

use super::{DType, Layout, Shape};

/// Shape, dtype, and layout of a tensor, without its storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorDescriptor {
    shape: Shape,
    dtype: DType,
    layout: Layout,
}

impl TensorDescriptor {
    pub fn new(shape: Shape, dtype: DType, layout: Layout) -> Self {
        TensorDescriptor {
            shape,
            dtype,
            layout,
        }
    }

    /// NCHW `f32` descriptor, the common case for recurrent inputs and outputs.
    pub fn nchw(num: usize, channel: usize, height: usize, width: usize) -> Self {
        Self::new(
            Shape::new(num, channel, height, width),
            DType::F32,
            Layout::Nchw,
        )
    }

    /// Flat `f32` descriptor holding `len` elements along the leading axis.
    pub fn vector(len: usize) -> Self {
        Self::new(Shape::new(len, 1, 1, 1), DType::F32, Layout::Nw)
    }

    /// Returns a copy tagged with `dtype`.
    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = dtype;
        self
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn num(&self) -> usize {
        self.shape.num()
    }

    pub fn channel(&self) -> usize {
        self.shape.channel()
    }

    pub fn height(&self) -> usize {
        self.shape.height()
    }

    pub fn width(&self) -> usize {
        self.shape.width()
    }

    /// Total number of valid elements described.
    ///
    /// Saturates instead of overflowing; shapes accepted by [`Self::set_shape`] never overflow.
    pub fn valid_size(&self) -> usize {
        self.shape.checked_num_elements().unwrap_or(usize::MAX)
    }

    /// Storage footprint implied by the extents and dtype.
    pub fn size_in_bytes(&self) -> usize {
        self.valid_size().saturating_mul(self.dtype.size_in_bytes())
    }

    /// Assigns new extents, leaving the descriptor untouched on failure.
    pub fn set_shape(&mut self, shape: Shape) -> OpResult<()> {
        if shape.has_zero_extent() {
            return Err(OpError::invalid_shape(format!(
                "zero extent in shape {shape}"
            )));
        }
        if shape.checked_num_elements().is_none() {
            return Err(OpError::invalid_shape(format!(
                "element count of shape {shape} overflows"
            )));
        }
        self.shape = shape;
        Ok(())
    }
}

impl Default for TensorDescriptor {
    fn default() -> Self {
        Self::nchw(1, 1, 1, 1)
    }
}
