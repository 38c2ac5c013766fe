//! Implementation kinds and the contract every kernel implementation satisfies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::device::{Device, ExecutionContext};
use crate::error::OpResult;
use crate::tensor::TensorDescriptor;

use super::policy::PolicyParseError;

/// Identity of an implementation candidate.
///
/// The registry accepts any kind; each operator decides which kinds it can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImplKind {
    /// Vendor-optimized library call.
    Vendor,
    /// Hand-written kernel that runs on any device.
    Generic,
    /// Host reference kernel used for parity checks by operators that ship one.
    Reference,
}

impl ImplKind {
    pub const ALL: [ImplKind; 3] = [ImplKind::Vendor, ImplKind::Generic, ImplKind::Reference];

    pub fn as_str(self) -> &'static str {
        match self {
            ImplKind::Vendor => "vendor",
            ImplKind::Generic => "generic",
            ImplKind::Reference => "reference",
        }
    }
}

impl fmt::Display for ImplKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImplKind {
    type Err = PolicyParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        ImplKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| PolicyParseError::UnknownKind(trimmed.to_string()))
    }
}

impl Serialize for ImplKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ImplKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One concrete way of executing an operator on device `D` with parameters `P`.
///
/// `init` runs once after the implementation becomes active and may cache plans derived from
/// shapes and parameters; `dispatch` runs on every execution.
pub trait Implementation<D: Device, P>: Send {
    fn kind(&self) -> ImplKind;

    /// Human-readable name, used in logs and launch records.
    fn name(&self) -> &'static str;

    fn init(
        &mut self,
        inputs: &[&TensorDescriptor],
        outputs: &[&TensorDescriptor],
        param: &P,
        ctx: &ExecutionContext<D>,
    ) -> OpResult<()>;

    fn dispatch(
        &mut self,
        inputs: &[&TensorDescriptor],
        outputs: &[&TensorDescriptor],
        param: &P,
        ctx: &ExecutionContext<D>,
    ) -> OpResult<()>;
}
