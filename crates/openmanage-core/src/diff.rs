// ── Idempotency / diff engine ──
//
// Desired configuration is a partial specification: only keys present in
// the desired mapping take part in the comparison, and keys whose desired
// value is `null` are treated as unspecified. Nested objects are compared
// the same way, recursively.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::error::CoreError;

/// Outcome of comparing desired against observed state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Diff {
    delta_keys: BTreeSet<String>,
}

impl Diff {
    /// `true` when every desired key already matches.
    pub fn is_noop(&self) -> bool {
        self.delta_keys.is_empty()
    }

    /// Top-level desired keys whose value differs from the observed one.
    pub fn delta_keys(&self) -> &BTreeSet<String> {
        &self.delta_keys
    }

    /// The subset of `desired` that actually needs to be sent.
    pub fn delta_payload(&self, desired: &Map<String, Value>) -> Map<String, Value> {
        desired
            .iter()
            .filter(|(key, _)| self.delta_keys.contains(*key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// What an operation should do about a difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Desired state already holds. Report `changed = false`.
    Noop,
    /// Check mode: report `changed = true` without mutating.
    WouldChange,
    /// Issue the mutating request; `changed` follows its outcome.
    Apply,
}

/// A computed [`Action`] together with the diff that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    action: Action,
    diff: Diff,
}

impl Plan {
    pub fn action(&self) -> Action {
        self.action
    }

    pub fn diff(&self) -> &Diff {
        &self.diff
    }
}

/// Compare `desired` against `observed` over the keys named in `desired`.
pub fn diff(desired: &Map<String, Value>, observed: &Map<String, Value>) -> Diff {
    let delta_keys = desired
        .iter()
        .filter(|(key, value)| differs(value, observed.get(*key)))
        .map(|(key, _)| key.clone())
        .collect();
    Diff { delta_keys }
}

/// Decide the action for a desired state.
///
/// `observed = None` means the current state could not be read; that is
/// an [`IndeterminateState`](CoreError::IndeterminateState) error rather
/// than a guess either way.
pub fn plan(
    desired: &Map<String, Value>,
    observed: Option<&Map<String, Value>>,
    dry_run: bool,
) -> Result<Plan, CoreError> {
    let observed = observed
        .ok_or_else(|| CoreError::indeterminate("the current state could not be retrieved"))?;
    let diff = diff(desired, observed);
    let action = if diff.is_noop() {
        Action::Noop
    } else if dry_run {
        Action::WouldChange
    } else {
        Action::Apply
    };
    Ok(Plan { action, diff })
}

/// Build a state mapping from literal entries.
pub fn state<const N: usize>(entries: [(&str, Value); N]) -> Map<String, Value> {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_owned(), value))
        .collect()
}

fn differs(desired: &Value, observed: Option<&Value>) -> bool {
    match (desired, observed) {
        (Value::Null, _) => false,
        (_, None) => true,
        (Value::Object(want), Some(Value::Object(have))) => want
            .iter()
            .any(|(key, value)| differs(value, have.get(key))),
        (want, Some(have)) => !scalars_match(want, have),
    }
}

/// Device attribute services report numbers as strings and back again
/// depending on firmware, so `"5"` and `5` are the same value here.
fn scalars_match(want: &Value, have: &Value) -> bool {
    if want == have {
        return true;
    }
    match (want, have) {
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            s.trim() == n.to_string()
        }
        _ => false,
    }
}
