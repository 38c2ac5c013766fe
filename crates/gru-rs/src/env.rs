use std::env;
use std::sync::OnceLock;

use crate::ops::policy::SelectionPolicy;

static GRURS_SELECTION_POLICY: OnceLock<SelectionPolicy> = OnceLock::new();

/// Policy applied to operators that have no explicit override.
///
/// Read once from `GRURS_SELECTION_POLICY`; unparsable values fall back to
/// [`SelectionPolicy::FirstRegistered`].
pub(crate) fn default_selection_policy() -> SelectionPolicy {
    *GRURS_SELECTION_POLICY.get_or_init(|| match env::var("GRURS_SELECTION_POLICY") {
        Ok(value) if !value.trim().is_empty() => match value.parse::<SelectionPolicy>() {
            Ok(policy) => policy,
            Err(err) => {
                log::warn!("ignoring GRURS_SELECTION_POLICY={value:?}: {err}");
                SelectionPolicy::FirstRegistered
            }
        },
        _ => SelectionPolicy::FirstRegistered,
    })
}
