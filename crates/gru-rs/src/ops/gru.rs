//! GRU operator: output shape inference plus vendor and generic kernel implementations.
//!
//! The same four-slot input descriptor is read two ways depending on
//! [`GruParam::is_hw2seq`]:
//!
//! - packed-sequence mode: `(seq_sum, word, 1, 1)`, where `seq_sum` is the summed length of
//!   every sequence in the batch;
//! - fixed-batch mode: `(_, seq_len, batch, word)`.
//!
//! Callers must check the mode flag before interpreting extents.

use crate::device::{Device, ExecutionContext, GruLaunch, SequenceLayout};
use crate::error::{OpError, OpResult};
use crate::params::{Activation, GruParam, GRU_GATES};
use crate::tensor::{Layout, Shape, TensorDescriptor};

use super::implementation::{ImplKind, Implementation};
use super::operator::{Operator, OperatorCore};
use super::policy::{SelectionOverrides, SelectionPolicy};

/// Upper bound on the packed sequence sum; outputs inferred without an input are sized to it.
pub const MAX_SEQ_SUM: usize = 1000;

/// Override key for GRU operators.
pub const GRU_OP_KEY: &str = "gru";

/// GRU operator on device `D`.
pub struct Gru<D: Device + 'static> {
    core: OperatorCore<D, GruParam>,
}

impl<D: Device + 'static> Gru<D> {
    /// Operator with no candidates, selecting the first registered one.
    pub fn new() -> Self {
        Self::with_policy(SelectionPolicy::FirstRegistered)
    }

    pub fn with_policy(policy: SelectionPolicy) -> Self {
        Gru {
            core: OperatorCore::new(policy),
        }
    }

    /// Operator whose policy comes from `overrides`, or from `GRURS_SELECTION_POLICY` when the
    /// overrides do not name `gru`.
    pub fn from_overrides(overrides: &SelectionOverrides) -> Self {
        Self::with_policy(overrides.policy(GRU_OP_KEY))
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.core.policy()
    }

    /// Kinds of every registered candidate, in registration order.
    pub fn implementation_kinds(&self) -> Vec<ImplKind> {
        self.core.kinds()
    }

    pub fn candidate_count(&self) -> usize {
        self.core.registry().len()
    }

    pub fn active_kind(&self) -> Option<ImplKind> {
        self.core.active().map(|implementation| implementation.kind())
    }
}

impl<D: Device + 'static> Default for Gru<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Device + 'static> Operator<D> for Gru<D> {
    type Param = GruParam;

    fn key(&self) -> &'static str {
        GRU_OP_KEY
    }

    fn core(&self) -> &OperatorCore<D, GruParam> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut OperatorCore<D, GruParam> {
        &mut self.core
    }

    fn infer_output_shape(
        &self,
        inputs: &[&TensorDescriptor],
        outputs: &mut [&mut TensorDescriptor],
        param: &GruParam,
    ) -> OpResult<()> {
        let output = outputs
            .first_mut()
            .ok_or_else(|| OpError::invalid_shape("gru expects an output descriptor"))?;
        param.validate_shape_fields()?;
        let width = param.output_width()?;

        let shape = if param.is_hw2seq {
            match inputs.first() {
                // Speculative inference before data is bound: size for the worst case.
                None => Shape::new(MAX_SEQ_SUM, width, 1, 1),
                Some(input) => {
                    let seq_sum = input.num();
                    if seq_sum > MAX_SEQ_SUM {
                        return Err(OpError::invalid_shape(format!(
                            "packed sequence sum {seq_sum} exceeds capacity {MAX_SEQ_SUM}"
                        )));
                    }
                    Shape::new(seq_sum, width, 1, 1)
                }
            }
        } else {
            let input = inputs.first().ok_or_else(|| {
                OpError::invalid_shape("fixed-batch gru expects an input descriptor")
            })?;
            Shape::new(1, input.channel(), input.height(), width)
        };

        log::debug!(
            "gru: inferred output {shape} (packed={}, hidden={}, directions={})",
            param.is_hw2seq,
            param.hidden_size(),
            param.num_direction
        );
        output.set_shape(shape)
    }

    fn create_implementation(
        &self,
        kind: ImplKind,
    ) -> OpResult<Box<dyn Implementation<D, GruParam>>> {
        match kind {
            ImplKind::Vendor => Ok(Box::new(VendorGru::new())),
            ImplKind::Generic => Ok(Box::new(GenericGru::new())),
            other => Err(OpError::UnsupportedImplementation(other)),
        }
    }
}

/// Workspace reserved by `init` and reused by every dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GruPlan {
    capacity_rows: usize,
    workspace_elems: usize,
}

fn sequence_layout(input: &TensorDescriptor, param: &GruParam) -> SequenceLayout {
    if param.is_hw2seq {
        SequenceLayout::Packed {
            seq_sum: input.num(),
            word: input.channel(),
        }
    } else {
        SequenceLayout::Padded {
            seq_len: input.channel(),
            batch: input.height(),
            word: input.width(),
        }
    }
}

/// Validates descriptors and parameters for execution and returns the sequence layout.
fn check_execution(
    inputs: &[&TensorDescriptor],
    outputs: &[&TensorDescriptor],
    param: &GruParam,
) -> OpResult<SequenceLayout> {
    param.validate()?;

    let input = inputs
        .first()
        .ok_or_else(|| OpError::invalid_shape("gru execution requires an input descriptor"))?;
    let output = outputs
        .first()
        .ok_or_else(|| OpError::invalid_shape("gru execution requires an output descriptor"))?;

    if input.layout() != Layout::Nchw {
        return Err(OpError::invalid_shape(format!(
            "gru input must use NCHW layout, got {}",
            input.layout()
        )));
    }
    if !input.dtype().is_float() {
        return Err(OpError::invalid_param(format!(
            "gru input must be floating point, got {:?}",
            input.dtype()
        )));
    }

    let layout = sequence_layout(input, param);
    if layout.rows() == 0 || layout.word() == 0 {
        return Err(OpError::invalid_shape(format!(
            "gru input {} has no time steps or features",
            input.shape()
        )));
    }

    let width = param.output_width()?;
    let output_fits = match layout {
        SequenceLayout::Packed { seq_sum, .. } => {
            seq_sum <= MAX_SEQ_SUM && output.num() >= seq_sum && output.channel() == width
        }
        SequenceLayout::Padded { seq_len, batch, .. } => {
            output.channel() == seq_len && output.height() == batch && output.width() == width
        }
    };
    if !output_fits {
        return Err(OpError::invalid_shape(format!(
            "output {} does not fit input {} (compute_output_shape not run on these inputs?)",
            output.shape(),
            input.shape()
        )));
    }

    let hidden = param.hidden_size();
    let weight_w = param
        .weight_w()
        .ok_or_else(|| OpError::invalid_param("missing input-to-hidden weights"))?;
    let weight_h = param
        .weight_h()
        .ok_or_else(|| OpError::invalid_param("missing hidden-to-hidden weights"))?;
    let expected_w = element_count(
        &[layout.word(), hidden, GRU_GATES],
        "input-to-hidden weights",
    )?;
    if weight_w.valid_size() != expected_w {
        return Err(OpError::invalid_param(format!(
            "input-to-hidden weights hold {} elements, expected {expected_w}",
            weight_w.valid_size()
        )));
    }
    let expected_h = element_count(&[hidden, hidden, GRU_GATES], "hidden-to-hidden weights")?;
    if weight_h.valid_size() != expected_h {
        return Err(OpError::invalid_param(format!(
            "hidden-to-hidden weights hold {} elements, expected {expected_h}",
            weight_h.valid_size()
        )));
    }

    Ok(layout)
}

/// Product of `factors`, or an `InvalidParam` naming `what` when it overflows.
fn element_count(factors: &[usize], what: &str) -> OpResult<usize> {
    factors
        .iter()
        .try_fold(1usize, |acc, factor| acc.checked_mul(*factor))
        .ok_or_else(|| OpError::invalid_param(format!("{what} element count overflows")))
}

fn capacity_rows(layout: SequenceLayout) -> usize {
    match layout {
        SequenceLayout::Packed { .. } => MAX_SEQ_SUM,
        SequenceLayout::Padded { .. } => layout.rows(),
    }
}

fn launch_planned<D: Device>(
    kind: ImplKind,
    name: &'static str,
    plan: Option<GruPlan>,
    inputs: &[&TensorDescriptor],
    outputs: &[&TensorDescriptor],
    param: &GruParam,
    ctx: &ExecutionContext<D>,
) -> OpResult<()> {
    let plan = plan.ok_or_else(|| OpError::device(format!("{name} dispatched before init")))?;
    let layout = check_execution(inputs, outputs, param)?;
    if layout.rows() > plan.capacity_rows {
        return Err(OpError::invalid_shape(format!(
            "{} time steps exceed the {} planned at init",
            layout.rows(),
            plan.capacity_rows
        )));
    }

    let launch = GruLaunch {
        kind,
        implementation: name,
        layout,
        hidden: param.hidden_size(),
        num_direction: param.num_direction,
        is_reverse: param.is_reverse,
        gate_activation: param.gate_activation,
        activation: param.activation,
        workspace_elems: plan.workspace_elems,
        stream_id: ctx.stream_id(),
    };
    ctx.device().launch(&launch)
}

/// GRU backed by the device's vendor library.
///
/// Needs a device that reports a vendor library and only supports sigmoid gates with a tanh
/// candidate activation.
#[derive(Debug, Default)]
pub struct VendorGru {
    plan: Option<GruPlan>,
}

impl VendorGru {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<D: Device> Implementation<D, GruParam> for VendorGru {
    fn kind(&self) -> ImplKind {
        ImplKind::Vendor
    }

    fn name(&self) -> &'static str {
        "vendor_gru"
    }

    fn init(
        &mut self,
        inputs: &[&TensorDescriptor],
        outputs: &[&TensorDescriptor],
        param: &GruParam,
        ctx: &ExecutionContext<D>,
    ) -> OpResult<()> {
        if !ctx.device().has_vendor_library() {
            return Err(OpError::device(format!(
                "device {} has no vendor GRU library",
                ctx.device().name()
            )));
        }
        if param.gate_activation != Activation::Sigmoid || param.activation != Activation::Tanh {
            return Err(OpError::invalid_param(format!(
                "vendor GRU supports sigmoid gates with tanh candidates only, got {}/{}",
                param.gate_activation, param.activation
            )));
        }

        let layout = check_execution(inputs, outputs, param)?;
        let capacity_rows = capacity_rows(layout);
        self.plan = Some(GruPlan {
            capacity_rows,
            workspace_elems: element_count(
                &[capacity_rows, GRU_GATES, param.output_width()?],
                "vendor workspace",
            )?,
        });
        Ok(())
    }

    fn dispatch(
        &mut self,
        inputs: &[&TensorDescriptor],
        outputs: &[&TensorDescriptor],
        param: &GruParam,
        ctx: &ExecutionContext<D>,
    ) -> OpResult<()> {
        launch_planned(
            ImplKind::Vendor,
            "vendor_gru",
            self.plan,
            inputs,
            outputs,
            param,
            ctx,
        )
    }
}

/// Hand-written GRU kernel that runs on any device and any activation pair.
///
/// Besides the gate buffer it keeps one hidden state row per time step so packed sequences
/// of any length mix fit in the same plan.
#[derive(Debug, Default)]
pub struct GenericGru {
    plan: Option<GruPlan>,
}

impl GenericGru {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<D: Device> Implementation<D, GruParam> for GenericGru {
    fn kind(&self) -> ImplKind {
        ImplKind::Generic
    }

    fn name(&self) -> &'static str {
        "generic_gru"
    }

    fn init(
        &mut self,
        inputs: &[&TensorDescriptor],
        outputs: &[&TensorDescriptor],
        param: &GruParam,
        _ctx: &ExecutionContext<D>,
    ) -> OpResult<()> {
        let layout = check_execution(inputs, outputs, param)?;
        let capacity_rows = capacity_rows(layout);
        let width = param.output_width()?;
        self.plan = Some(GruPlan {
            capacity_rows,
            // Gate buffer plus one hidden state row per time step.
            workspace_elems: element_count(
                &[capacity_rows, GRU_GATES + 1, width],
                "generic workspace",
            )?,
        });
        Ok(())
    }

    fn dispatch(
        &mut self,
        inputs: &[&TensorDescriptor],
        outputs: &[&TensorDescriptor],
        param: &GruParam,
        ctx: &ExecutionContext<D>,
    ) -> OpResult<()> {
        launch_planned(
            ImplKind::Generic,
            "generic_gru",
            self.plan,
            inputs,
            outputs,
            param,
            ctx,
        )
    }
}
