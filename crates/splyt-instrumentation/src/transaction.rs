//! Transaction builder.

use crate::data_point::Properties;
use crate::{Instrumentation, InstrumentationResult};
use serde_json::Value;

/// Timeout measured from the last update of this transaction.
pub const TIMEOUT_MODE_TRANSACTION: &str = "TXN";

/// Timeout measured from the last update of any transaction.
pub const TIMEOUT_MODE_ANY: &str = "ANY";

pub const TXN_SUCCESS: &str = "success";
pub const TXN_ERROR: &str = "error";

/// A transaction with a category and an optional ID.
///
/// Properties accumulate until the next `begin`, `update` or `end`, which
/// sends them and starts a fresh set.
#[derive(Clone)]
pub struct Transaction {
    instrumentation: Instrumentation,
    category: String,
    transaction_id: Option<String>,
    timeout_mode: String,
    timeout: f64,
    result: String,
    properties: Properties,
}

impl Transaction {
    pub(crate) fn new(
        instrumentation: Instrumentation,
        category: String,
        transaction_id: Option<String>,
    ) -> Self {
        Self {
            instrumentation,
            category,
            transaction_id,
            timeout_mode: TIMEOUT_MODE_TRANSACTION.to_string(),
            timeout: -1.0,
            result: TXN_SUCCESS.to_string(),
            properties: Properties::new(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    /// Properties waiting to be sent.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Merge a copy of `properties`; later calls with the same key win.
    pub fn set_properties(&mut self, properties: &Properties) -> &mut Self {
        self.properties
            .extend(properties.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Begin with the default timeout mode and server-side timeout.
    pub fn begin(&mut self) -> InstrumentationResult<()> {
        let properties = std::mem::take(&mut self.properties);
        self.instrumentation.begin_transaction(
            &self.category,
            &self.timeout_mode,
            self.timeout,
            self.transaction_id.as_deref(),
            &properties,
        )
    }

    /// Begin with an explicit timeout mode and timeout in seconds.
    pub fn begin_with_timeout(
        &mut self,
        timeout_mode: impl Into<String>,
        timeout: f64,
    ) -> InstrumentationResult<()> {
        self.timeout_mode = timeout_mode.into();
        self.timeout = timeout;
        self.begin()
    }

    /// Report progress, 0 to 100.
    pub fn update(&mut self, progress: u8) -> InstrumentationResult<()> {
        let properties = std::mem::take(&mut self.properties);
        self.instrumentation.update_transaction(
            &self.category,
            progress,
            self.transaction_id.as_deref(),
            &properties,
        )
    }

    /// End with the current result (`success` unless set).
    pub fn end(&mut self) -> InstrumentationResult<()> {
        let properties = std::mem::take(&mut self.properties);
        self.instrumentation.end_transaction(
            &self.category,
            &self.result,
            self.transaction_id.as_deref(),
            &properties,
        )
    }

    pub fn end_with_result(&mut self, result: impl Into<String>) -> InstrumentationResult<()> {
        self.result = result.into();
        self.end()
    }

    /// Report an instantaneous transaction. The collector treats an end
    /// without a begin as both.
    pub fn begin_and_end(&mut self) -> InstrumentationResult<()> {
        self.end()
    }

    pub fn begin_and_end_with_result(
        &mut self,
        result: impl Into<String>,
    ) -> InstrumentationResult<()> {
        self.end_with_result(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_depot::EventDepot;
    use serde_json::json;

    fn transaction() -> Transaction {
        Instrumentation::new(EventDepot::new(), "device-1").transaction_with_id("level", "l-1")
    }

    #[test]
    fn test_defaults() {
        let txn = transaction();
        assert_eq!(txn.category(), "level");
        assert_eq!(txn.transaction_id(), Some("l-1"));
        assert_eq!(txn.timeout_mode, TIMEOUT_MODE_TRANSACTION);
        assert_eq!(txn.timeout, -1.0);
        assert_eq!(txn.result, TXN_SUCCESS);
    }

    #[test]
    fn test_properties_merge_and_copy() {
        let mut source = Properties::new();
        source.insert("a".to_string(), json!([1, 2]));

        let mut txn = transaction();
        txn.set_property("a", 0).set_properties(&source).set_property("b", "x");
        source.insert("a".to_string(), json!("mutated"));

        assert_eq!(txn.properties().get("a"), Some(&json!([1, 2])));
        assert_eq!(txn.properties().get("b"), Some(&json!("x")));
    }

    #[test]
    fn test_properties_cleared_even_when_store_fails() {
        let mut txn = transaction();
        txn.set_property("k", 1);

        // Depot was never initialized.
        assert!(txn.begin().is_err());
        assert!(txn.properties().is_empty());
    }
}
