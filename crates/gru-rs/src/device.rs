//! Device capability handles consumed by runtime selection and execution.
//!
//! A [`Device`] is owned by the caller. Operators only borrow it through an
//! [`ExecutionContext`] for the duration of a call, and hand kernel launches to it as
//! [`GruLaunch`] descriptors; the numeric kernels live behind the device.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{OpError, OpResult};
use crate::ops::ImplKind;
use crate::params::Activation;

/// Interpretation of the input sequence axes for a launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceLayout {
    /// Variable-length sequences concatenated along the leading axis.
    Packed { seq_sum: usize, word: usize },
    /// Rectangular batch of equally long sequences.
    Padded {
        seq_len: usize,
        batch: usize,
        word: usize,
    },
}

impl SequenceLayout {
    /// Number of time steps processed across the whole batch.
    pub fn rows(&self) -> usize {
        match *self {
            SequenceLayout::Packed { seq_sum, .. } => seq_sum,
            SequenceLayout::Padded { seq_len, batch, .. } => seq_len * batch,
        }
    }

    pub fn word(&self) -> usize {
        match *self {
            SequenceLayout::Packed { word, .. } | SequenceLayout::Padded { word, .. } => word,
        }
    }
}

/// Everything a device needs to run one GRU kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct GruLaunch {
    pub kind: ImplKind,
    pub implementation: &'static str,
    pub layout: SequenceLayout,
    pub hidden: usize,
    pub num_direction: usize,
    pub is_reverse: bool,
    pub gate_activation: Activation,
    pub activation: Activation,
    /// Scratch elements reserved at init time.
    pub workspace_elems: usize,
    pub stream_id: u32,
}

/// Capability interface of the device an operator runs on.
pub trait Device: Send + Sync {
    /// Human-readable identifier used in logs.
    fn name(&self) -> &str;

    /// Whether the vendor kernel library is usable on this device.
    fn has_vendor_library(&self) -> bool;

    /// Runs (or enqueues) one GRU kernel.
    fn launch(&self, launch: &GruLaunch) -> OpResult<()>;
}

/// Borrowed view of the device plus the stream work is issued on.
pub struct ExecutionContext<D: Device> {
    device: Arc<D>,
    stream_id: u32,
}

impl<D: Device> ExecutionContext<D> {
    pub fn new(device: Arc<D>) -> Self {
        ExecutionContext {
            device,
            stream_id: 0,
        }
    }

    pub fn with_stream(mut self, stream_id: u32) -> Self {
        self.stream_id = stream_id;
        self
    }

    pub fn device(&self) -> &D {
        self.device.as_ref()
    }

    pub fn stream_id(&self) -> u32 {
        self.stream_id
    }
}

impl<D: Device> Clone for ExecutionContext<D> {
    fn clone(&self) -> Self {
        ExecutionContext {
            device: Arc::clone(&self.device),
            stream_id: self.stream_id,
        }
    }
}

/// Host device without a vendor library.
///
/// Launches are validated and counted; the host kernels themselves belong to the
/// surrounding runtime.
#[derive(Debug, Default)]
pub struct HostDevice {
    launches: AtomicUsize,
}

impl HostDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of launches accepted so far.
    pub fn launch_count(&self) -> usize {
        self.launches.load(Ordering::Relaxed)
    }
}

impl Device for HostDevice {
    fn name(&self) -> &str {
        "host"
    }

    fn has_vendor_library(&self) -> bool {
        false
    }

    fn launch(&self, launch: &GruLaunch) -> OpResult<()> {
        if launch.kind == ImplKind::Vendor {
            return Err(OpError::device("host device cannot run vendor kernels"));
        }
        if launch.hidden == 0 || launch.layout.rows() == 0 {
            return Err(OpError::device(format!(
                "empty launch for {}: {:?}",
                launch.implementation, launch.layout
            )));
        }
        self.launches.fetch_add(1, Ordering::Relaxed);
        log::trace!(
            "host launch {} rows={} hidden={} stream={}",
            launch.implementation,
            launch.layout.rows(),
            launch.hidden,
            launch.stream_id
        );
        Ok(())
    }
}
