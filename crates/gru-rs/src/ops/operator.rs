//! The operator contract shared by every operator type.
//!
//! Concrete operators supply shape inference and an implementation factory; registration,
//! the three selection entry points, and execution are provided on top of an
//! [`OperatorCore`] the operator owns.

use crate::device::{Device, ExecutionContext};
use crate::error::{OpError, OpResult};
use crate::tensor::TensorDescriptor;

use super::implementation::{ImplKind, Implementation};
use super::policy::SelectionPolicy;
use super::registry::ImplementationRegistry;

/// Where an operator is in its registration/selection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    /// No candidates registered yet.
    Unregistered,
    /// Candidates exist but none has been selected.
    ReadyToSelect,
    /// A selection call has set the active candidate.
    ActiveSet,
}

/// Candidate registry, selection policy, and shape bookkeeping owned by an operator.
pub struct OperatorCore<D: Device + 'static, P: 'static> {
    registry: ImplementationRegistry<dyn Implementation<D, P>>,
    policy: SelectionPolicy,
    shape_ready: bool,
}

impl<D: Device + 'static, P: 'static> OperatorCore<D, P> {
    pub fn new(policy: SelectionPolicy) -> Self {
        OperatorCore {
            registry: ImplementationRegistry::new(),
            policy,
            shape_ready: false,
        }
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: SelectionPolicy) {
        self.policy = policy;
    }

    pub fn registry(&self) -> &ImplementationRegistry<dyn Implementation<D, P>> {
        &self.registry
    }

    /// Kinds of the registered candidates in registration order.
    pub fn kinds(&self) -> Vec<ImplKind> {
        self.registry.iter().map(|candidate| candidate.kind()).collect()
    }

    pub fn is_shape_ready(&self) -> bool {
        self.shape_ready
    }

    pub fn mark_shape_ready(&mut self) {
        self.shape_ready = true;
    }

    pub fn state(&self) -> SelectionState {
        if self.registry.is_empty() {
            SelectionState::Unregistered
        } else if self.registry.active_index().is_none() {
            SelectionState::ReadyToSelect
        } else {
            SelectionState::ActiveSet
        }
    }

    pub fn register(&mut self, op: &str, implementation: Box<dyn Implementation<D, P>>) {
        let kind = implementation.kind();
        let name = implementation.name();
        let index = self.registry.register(implementation);
        log::debug!("{op}: registered {kind} implementation {name} as candidate #{index}");
    }

    pub fn active(&self) -> Option<&dyn Implementation<D, P>> {
        self.registry.active()
    }

    /// Resolves the active candidate through the configured policy.
    pub fn select_with_policy(&mut self, op: &str, entry: &str) -> OpResult<()> {
        if !self.shape_ready {
            return Err(OpError::ShapeNotReady);
        }
        let kinds = self.kinds();
        let index = self.policy.resolve(&kinds).ok_or(OpError::NoCandidates)?;
        self.activate(op, entry, index);
        Ok(())
    }

    /// Activates the first candidate of `kind`; the active candidate is unchanged on failure.
    ///
    /// An empty registry yields `ImplementationNotRegistered` as well.
    pub fn select_kind(&mut self, op: &str, kind: ImplKind) -> OpResult<()> {
        if !self.shape_ready {
            return Err(OpError::ShapeNotReady);
        }
        let index = self
            .registry
            .position(|candidate| candidate.kind() == kind)
            .ok_or(OpError::ImplementationNotRegistered(kind))?;
        self.activate(op, "specified", index);
        Ok(())
    }

    /// Initializes the active candidate on first use after a selection, then dispatches it.
    pub fn execute(
        &mut self,
        op: &str,
        inputs: &[&TensorDescriptor],
        outputs: &[&TensorDescriptor],
        param: &P,
        ctx: &ExecutionContext<D>,
    ) -> OpResult<()> {
        if !self.shape_ready {
            return Err(OpError::ShapeNotReady);
        }
        if !self.registry.is_initialized() {
            let implementation = self.registry.active_mut().ok_or(OpError::NotSelected)?;
            implementation.init(inputs, outputs, param, ctx)?;
            log::debug!(
                "{op}: initialized {} on device {}",
                implementation.name(),
                ctx.device().name()
            );
            self.registry.mark_initialized();
        }
        let implementation = self.registry.active_mut().ok_or(OpError::NotSelected)?;
        implementation.dispatch(inputs, outputs, param, ctx)
    }

    fn activate(&mut self, op: &str, entry: &str, index: usize) {
        if let Some(active) = self.registry.set_active(index) {
            log::debug!(
                "{op}: {entry} selection activated {} ({}) at #{index} under policy {}",
                active.name(),
                active.kind(),
                self.policy
            );
        }
    }
}

/// Public surface an operator exposes to the graph builder and executor.
pub trait Operator<D: Device + 'static> {
    type Param: 'static;

    /// Name used for override lookup and log messages.
    fn key(&self) -> &'static str;

    fn core(&self) -> &OperatorCore<D, Self::Param>;

    fn core_mut(&mut self) -> &mut OperatorCore<D, Self::Param>;

    /// Derives output extents from inputs and parameters without marking the operator ready.
    fn infer_output_shape(
        &self,
        inputs: &[&TensorDescriptor],
        outputs: &mut [&mut TensorDescriptor],
        param: &Self::Param,
    ) -> OpResult<()>;

    /// Builds a fresh candidate of `kind`, or reports it as unsupported.
    fn create_implementation(
        &self,
        kind: ImplKind,
    ) -> OpResult<Box<dyn Implementation<D, Self::Param>>>;

    fn compute_output_shape(
        &mut self,
        inputs: &[&TensorDescriptor],
        outputs: &mut [&mut TensorDescriptor],
        param: &Self::Param,
    ) -> OpResult<()> {
        self.infer_output_shape(inputs, outputs, param)?;
        self.core_mut().mark_shape_ready();
        Ok(())
    }

    /// Appends one new candidate of `kind`. Repeated kinds yield independent candidates.
    fn register_implementation(&mut self, kind: ImplKind) -> OpResult<()> {
        let implementation = self.create_implementation(kind)?;
        let op = self.key();
        self.core_mut().register(op, implementation);
        Ok(())
    }

    /// Selection without runtime information, as done at graph-compile time.
    fn select_static(&mut self) -> OpResult<()> {
        let op = self.key();
        self.core_mut().select_with_policy(op, "static")
    }

    /// Selection with full runtime information.
    ///
    /// The shipped policies do not consult shapes or the device; they are passed so that
    /// cost-based policies can be added without changing callers.
    fn select_runtime(
        &mut self,
        _inputs: &[&TensorDescriptor],
        _outputs: &[&TensorDescriptor],
        _param: &Self::Param,
        ctx: &ExecutionContext<D>,
    ) -> OpResult<()> {
        let op = self.key();
        log::trace!("{op}: runtime selection on device {}", ctx.device().name());
        self.core_mut().select_with_policy(op, "runtime")
    }

    /// Forces the first candidate of `kind`.
    fn select_specified(&mut self, kind: ImplKind) -> OpResult<()> {
        let op = self.key();
        self.core_mut().select_kind(op, kind)
    }

    fn active_implementation(&self) -> Option<&dyn Implementation<D, Self::Param>> {
        self.core().active()
    }

    fn state(&self) -> SelectionState {
        self.core().state()
    }

    /// Runs the active candidate: `init` once per selection, then `dispatch`.
    fn execute(
        &mut self,
        inputs: &[&TensorDescriptor],
        outputs: &[&TensorDescriptor],
        param: &Self::Param,
        ctx: &ExecutionContext<D>,
    ) -> OpResult<()> {
        let op = self.key();
        self.core_mut().execute(op, inputs, outputs, param, ctx)
    }
}
