//! Configuration bundle read by the GRU operator and its implementations.

use std::fmt;

use crate::error::{OpError, OpResult};
use crate::tensor::TensorDescriptor;

/// Number of gates in a GRU cell (update, reset, candidate).
pub const GRU_GATES: usize = 3;

/// Elementwise activations a GRU can apply to its gates and candidate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activation {
    Sigmoid,
    Tanh,
    Relu,
    Identity,
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
            Activation::Relu => "relu",
            Activation::Identity => "identity",
        };
        f.write_str(name)
    }
}

/// GRU layer configuration.
///
/// Shape inference reads only `is_hw2seq`, `num_direction`, and the bias descriptor. The
/// remaining fields are checked by implementations when they initialize.
#[derive(Debug, Clone, PartialEq)]
pub struct GruParam {
    /// Packed-sequence input (`true`) or fixed-batch input (`false`).
    pub is_hw2seq: bool,
    /// 1 for unidirectional, 2 for bidirectional.
    pub num_direction: usize,
    pub num_layers: usize,
    pub is_reverse: bool,
    pub dropout: f32,
    pub gate_activation: Activation,
    pub activation: Activation,
    bias: TensorDescriptor,
    weight_w: Option<TensorDescriptor>,
    weight_h: Option<TensorDescriptor>,
}

impl GruParam {
    /// Unidirectional, packed-sequence configuration with default activations.
    pub fn new(bias: TensorDescriptor) -> Self {
        GruParam {
            is_hw2seq: true,
            num_direction: 1,
            num_layers: 1,
            is_reverse: false,
            dropout: 0.0,
            gate_activation: Activation::Sigmoid,
            activation: Activation::Tanh,
            bias,
            weight_w: None,
            weight_h: None,
        }
    }

    pub fn packed(mut self, is_hw2seq: bool) -> Self {
        self.is_hw2seq = is_hw2seq;
        self
    }

    pub fn with_direction(mut self, num_direction: usize) -> Self {
        self.num_direction = num_direction;
        self
    }

    pub fn with_layers(mut self, num_layers: usize) -> Self {
        self.num_layers = num_layers;
        self
    }

    pub fn reversed(mut self, is_reverse: bool) -> Self {
        self.is_reverse = is_reverse;
        self
    }

    pub fn with_dropout(mut self, dropout: f32) -> Self {
        self.dropout = dropout;
        self
    }

    pub fn with_activations(mut self, gate: Activation, candidate: Activation) -> Self {
        self.gate_activation = gate;
        self.activation = candidate;
        self
    }

    /// Attaches the input-to-hidden (`weight_w`) and hidden-to-hidden (`weight_h`) weights.
    pub fn with_weights(mut self, weight_w: TensorDescriptor, weight_h: TensorDescriptor) -> Self {
        self.weight_w = Some(weight_w);
        self.weight_h = Some(weight_h);
        self
    }

    pub fn bias(&self) -> &TensorDescriptor {
        &self.bias
    }

    pub fn weight_w(&self) -> Option<&TensorDescriptor> {
        self.weight_w.as_ref()
    }

    pub fn weight_h(&self) -> Option<&TensorDescriptor> {
        self.weight_h.as_ref()
    }

    /// Per-gate hidden width recovered from the bias element count.
    pub fn hidden_size(&self) -> usize {
        self.bias.valid_size() / GRU_GATES
    }

    /// Output feature width: hidden width scaled by the direction multiplier.
    pub fn output_width(&self) -> OpResult<usize> {
        let hidden = self.hidden_size();
        match hidden.checked_mul(self.num_direction) {
            Some(width) => Ok(width),
            None => Err(OpError::invalid_param(format!(
                "output width overflows for hidden {hidden} and {} directions",
                self.num_direction
            ))),
        }
    }

    /// Checks the fields shape inference reads: the direction count and the bias length.
    pub fn validate_shape_fields(&self) -> OpResult<()> {
        if !matches!(self.num_direction, 1 | 2) {
            return Err(OpError::invalid_param(format!(
                "num_direction must be 1 or 2, got {}",
                self.num_direction
            )));
        }
        let bias_len = self.bias.valid_size();
        if bias_len == 0 || bias_len % GRU_GATES != 0 {
            return Err(OpError::invalid_param(format!(
                "bias element count {bias_len} is not a positive multiple of {GRU_GATES}"
            )));
        }
        Ok(())
    }

    /// Checks the scalar configuration and the bias; weights are checked against the input
    /// width by the implementations.
    pub fn validate(&self) -> OpResult<()> {
        self.validate_shape_fields()?;
        if self.num_layers == 0 {
            return Err(OpError::invalid_param("num_layers must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(OpError::invalid_param(format!(
                "dropout must lie in [0, 1), got {}",
                self.dropout
            )));
        }
        Ok(())
    }
}
