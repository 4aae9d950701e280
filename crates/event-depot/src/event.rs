//! The telemetry event carried through the depot.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One reportable telemetry occurrence.
///
/// Serialized as `{"method": ..., "args": [...]}`. Events are immutable;
/// the depot only ever moves them between bins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    method: String,
    args: Vec<Value>,
}

impl Event {
    /// Create an event for a collector method.
    pub fn new(method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            args,
        }
    }

    /// Collector method name, e.g. `datacollector_updateUserState`.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Positional arguments, in order.
    pub fn args(&self) -> &[Value] {
        &self.args
    }
}
