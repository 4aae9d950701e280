//! Turning an instrumentation call into a depot [`Event`].

use event_depot::Event;
use serde_json::{Map, Value};

/// Free-form, possibly nested, key/value properties.
pub type Properties = Map<String, Value>;

/// Who a data point is attributed to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityIds {
    pub user_id: Option<String>,
    pub device_id: Option<String>,
}

impl EntityIds {
    /// Device ID, if set and non-empty.
    pub fn valid_device_id(&self) -> Option<&str> {
        self.device_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Collects the call-specific arguments of one collector method.
///
/// The built event's arguments are `[timestamp, timestamp, user_id,
/// device_id, ...args]`. The timestamp appears twice because the collector
/// takes both a send time and an event time.
#[derive(Debug, Clone)]
pub struct DataPointBuilder {
    method: String,
    args: Vec<Value>,
}

impl DataPointBuilder {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Append a property map. The map is copied.
    pub fn properties(self, properties: &Properties) -> Self {
        self.arg(Value::Object(properties.clone()))
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn build(self, ids: &EntityIds, timestamp: f64) -> Event {
        let mut args = Vec::with_capacity(self.args.len() + 4);
        args.push(Value::from(timestamp));
        args.push(Value::from(timestamp));
        args.push(ids.user_id.clone().map_or(Value::Null, Value::String));
        args.push(ids.device_id.clone().map_or(Value::Null, Value::String));
        args.extend(self.args);
        Event::new(self.method, args)
    }
}
