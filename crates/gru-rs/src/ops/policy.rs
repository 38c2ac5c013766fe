//! Selection policies and the user-facing overrides that configure them.
//!
//! Static and runtime selection resolve through a [`SelectionPolicy`]. The default keeps the
//! historical behaviour of activating the first registered candidate; overrides can steer an
//! operator towards a preferred kind without touching graph construction code.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::implementation::ImplKind;

/// Errors raised while parsing policy strings and kind names.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyParseError {
    #[error("unknown implementation kind: {0}")]
    UnknownKind(String),
    #[error("unknown selection policy option: {0}")]
    UnknownOption(String),
}

/// How static and runtime selection pick among registered candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    /// Activate the first registered candidate regardless of kind or context.
    #[default]
    FirstRegistered,
    /// Activate the first candidate of the given kind, falling back to the first candidate.
    Prefer(ImplKind),
}

impl SelectionPolicy {
    /// Resolves the candidate position for the given registration-ordered kinds.
    ///
    /// Returns `None` only when `kinds` is empty.
    pub fn resolve(self, kinds: &[ImplKind]) -> Option<usize> {
        if kinds.is_empty() {
            return None;
        }
        match self {
            SelectionPolicy::FirstRegistered => Some(0),
            SelectionPolicy::Prefer(preferred) => Some(
                kinds
                    .iter()
                    .position(|kind| *kind == preferred)
                    .unwrap_or(0),
            ),
        }
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionPolicy::FirstRegistered => f.write_str("first"),
            SelectionPolicy::Prefer(kind) => write!(f, "prefer={kind}"),
        }
    }
}

/// Accepts `first`, `prefer=<kind>`, or a bare kind name. Empty input means `first`.
impl FromStr for SelectionPolicy {
    type Err = PolicyParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("first") {
            return Ok(SelectionPolicy::FirstRegistered);
        }

        if let Some(rest) = trimmed.strip_prefix("prefer=") {
            return Ok(SelectionPolicy::Prefer(rest.parse()?));
        }

        if trimmed.contains('=') {
            return Err(PolicyParseError::UnknownOption(trimmed.to_string()));
        }

        // Bare kind names are shorthand for `prefer=<kind>`.
        Ok(SelectionPolicy::Prefer(trimmed.parse()?))
    }
}

impl Serialize for SelectionPolicy {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SelectionPolicy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Per-operator policy overrides, keyed by operator name (e.g. `"gru"`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionOverrides {
    #[serde(flatten)]
    overrides: HashMap<String, SelectionPolicy>,
}

impl SelectionOverrides {
    /// Records `policy` for operator `key`, replacing any previous entry.
    pub fn set(&mut self, key: impl Into<String>, policy: SelectionPolicy) {
        self.overrides.insert(key.into(), policy);
    }

    /// Returns the policy configured for `key`.
    /// Falls back to the process-wide default from `GRURS_SELECTION_POLICY`.
    pub fn policy(&self, key: &str) -> SelectionPolicy {
        self.overrides
            .get(key)
            .copied()
            .unwrap_or_else(crate::env::default_selection_policy)
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}
