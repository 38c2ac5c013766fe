//! Fixed four-axis extents with NCHW accessors.

use std::fmt;

/// Stores the four logical extents of a descriptor.
///
/// Axis meaning is decided by the operator reading the shape; the accessors use NCHW names
/// only because that is the slot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Shape {
    dims: [usize; 4],
}

impl Shape {
    pub const fn new(num: usize, channel: usize, height: usize, width: usize) -> Self {
        Shape {
            dims: [num, channel, height, width],
        }
    }

    /// Borrow the raw extents for downstream calculations.
    pub fn dims(&self) -> &[usize; 4] {
        &self.dims
    }

    pub fn num(&self) -> usize {
        self.dims[0]
    }

    pub fn channel(&self) -> usize {
        self.dims[1]
    }

    pub fn height(&self) -> usize {
        self.dims[2]
    }

    pub fn width(&self) -> usize {
        self.dims[3]
    }

    /// Computes the total number of elements implied by the shape.
    ///
    /// Returns `None` on overflow.
    pub fn checked_num_elements(&self) -> Option<usize> {
        self.dims
            .iter()
            .try_fold(1usize, |count, dim| count.checked_mul(*dim))
    }

    /// Whether any axis has zero extent.
    pub fn has_zero_extent(&self) -> bool {
        self.dims.contains(&0)
    }
}

impl From<[usize; 4]> for Shape {
    fn from(dims: [usize; 4]) -> Self {
        Shape { dims }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [n, c, h, w] = self.dims;
        write!(f, "({n}, {c}, {h}, {w})")
    }
}
