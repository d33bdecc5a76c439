// ── Result contract ──
//
// `OperationResult` is the one value handed back to the orchestrator.
// Flags are fixed by the constructor used; a failed result can never
// report `changed = true`.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Keys owned by the contract itself; payload entries may not shadow them.
const RESERVED_KEYS: &[&str] = &["changed", "failed", "msg", "unreachable"];

/// Final outcome of one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
    changed: bool,
    failed: bool,
    unreachable: bool,
    msg: String,
    payload: Map<String, Value>,
}

impl OperationResult {
    /// Success with no change.
    pub fn ok(msg: impl Into<String>) -> Self {
        Self::build(false, false, false, msg)
    }

    /// Success that changed (or in check mode would change) the device.
    pub fn changed(msg: impl Into<String>) -> Self {
        Self::build(true, false, false, msg)
    }

    /// Success whose `changed` flag is computed by the caller.
    pub fn with_changed(changed: bool, msg: impl Into<String>) -> Self {
        Self::build(changed, false, false, msg)
    }

    /// Hard failure. Always `changed = false`.
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::build(false, true, false, msg)
    }

    /// The device could not be reached. Failed, and flagged so the
    /// orchestrator can classify the host as unreachable.
    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::build(false, true, true, msg)
    }

    /// Map an error from anywhere in the operation onto the contract.
    pub fn from_error(err: CoreError) -> Self {
        if err.is_unreachable() {
            return Self::unreachable(err.to_string());
        }
        match err {
            CoreError::RemoteOperation { message, payload } => {
                let mut result = Self::failed(message);
                for (key, value) in payload {
                    result = result.with_payload(&key, value);
                }
                result
            }
            other => Self::failed(other.to_string()),
        }
    }

    /// Attach a resource-specific payload entry. Reserved keys are ignored.
    pub fn with_payload(mut self, key: &str, value: Value) -> Self {
        if !RESERVED_KEYS.contains(&key) {
            self.payload.insert(key.to_owned(), value);
        }
        self
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn is_unreachable(&self) -> bool {
        self.unreachable
    }

    pub fn msg(&self) -> &str {
        &self.msg
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Render as the flat JSON object the orchestrator consumes.
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        out.insert("changed".into(), Value::Bool(self.changed));
        out.insert("failed".into(), Value::Bool(self.failed));
        out.insert("msg".into(), Value::String(self.msg.clone()));
        if self.unreachable {
            out.insert("unreachable".into(), Value::Bool(true));
        }
        for (key, value) in &self.payload {
            out.insert(key.clone(), value.clone());
        }
        Value::Object(out)
    }

    fn build(changed: bool, failed: bool, unreachable: bool, msg: impl Into<String>) -> Self {
        Self {
            changed: changed && !failed,
            failed,
            unreachable,
            msg: msg.into(),
            payload: Map::new(),
        }
    }
}

impl Serialize for OperationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = 3 + usize::from(self.unreachable) + self.payload.len();
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("changed", &self.changed)?;
        map.serialize_entry("failed", &self.failed)?;
        map.serialize_entry("msg", &self.msg)?;
        if self.unreachable {
            map.serialize_entry("unreachable", &true)?;
        }
        for (key, value) in &self.payload {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
