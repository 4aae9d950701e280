//! Instrumentation calls that feed the event depot.

use crate::data_point::{DataPointBuilder, EntityIds, Properties};
use crate::transaction::Transaction;
use crate::{InstrumentationError, InstrumentationResult};
use event_depot::EventDepot;
use parking_lot::RwLock;
use splyt_config_and_utils::micro_timestamp;
use std::sync::Arc;
use tracing::{debug, error};

/// Front door for reporting data points.
///
/// Cheap to clone. Every call is attributed to the current user and device
/// and handed to the depot without blocking.
#[derive(Clone)]
pub struct Instrumentation {
    depot: EventDepot,
    ids: Arc<RwLock<EntityIds>>,
}

impl Instrumentation {
    pub fn new(depot: EventDepot, device_id: impl Into<String>) -> Self {
        Self {
            depot,
            ids: Arc::new(RwLock::new(EntityIds {
                user_id: None,
                device_id: Some(device_id.into()),
            })),
        }
    }

    pub fn depot(&self) -> &EventDepot {
        &self.depot
    }

    pub fn user_id(&self) -> Option<String> {
        self.ids.read().user_id.clone()
    }

    /// Attribute subsequent data points to `user_id`, or to no user.
    pub fn set_user_id(&self, user_id: Option<String>) {
        self.ids.write().user_id = user_id;
    }

    pub fn device_id(&self) -> Option<String> {
        self.ids.read().device_id.clone()
    }

    /// Start building a transaction.
    pub fn transaction(&self, category: impl Into<String>) -> Transaction {
        Transaction::new(self.clone(), category.into(), None)
    }

    pub fn transaction_with_id(
        &self,
        category: impl Into<String>,
        transaction_id: impl Into<String>,
    ) -> Transaction {
        Transaction::new(self.clone(), category.into(), Some(transaction_id.into()))
    }

    pub fn begin_transaction(
        &self,
        category: &str,
        timeout_mode: &str,
        timeout: f64,
        transaction_id: Option<&str>,
        properties: &Properties,
    ) -> InstrumentationResult<()> {
        self.send(
            DataPointBuilder::new("datacollector_beginTransaction")
                .arg(category)
                .arg(timeout_mode)
                .arg(timeout)
                .arg(transaction_id)
                .properties(properties),
        )
    }

    pub fn update_transaction(
        &self,
        category: &str,
        progress: u8,
        transaction_id: Option<&str>,
        properties: &Properties,
    ) -> InstrumentationResult<()> {
        if progress > 100 {
            return Err(InstrumentationError::InvalidArgs(format!(
                "progress {progress} is outside 0..=100"
            )));
        }
        self.send(
            DataPointBuilder::new("datacollector_updateTransaction")
                .arg(category)
                .arg(progress)
                .arg(transaction_id)
                .properties(properties),
        )
    }

    pub fn end_transaction(
        &self,
        category: &str,
        result: &str,
        transaction_id: Option<&str>,
        properties: &Properties,
    ) -> InstrumentationResult<()> {
        self.send(
            DataPointBuilder::new("datacollector_endTransaction")
                .arg(category)
                .arg(result)
                .arg(transaction_id)
                .properties(properties),
        )
    }

    /// Report user state. Properties may be nested.
    pub fn update_user_state(&self, properties: &Properties) -> InstrumentationResult<()> {
        self.send(DataPointBuilder::new("datacollector_updateUserState").properties(properties))
    }

    /// Report device state. Properties may be nested.
    pub fn update_device_state(&self, properties: &Properties) -> InstrumentationResult<()> {
        self.send(DataPointBuilder::new("datacollector_updateDeviceState").properties(properties))
    }

    /// Record a collection balance. A negative modification reduces it.
    pub fn update_collection(
        &self,
        name: &str,
        balance: f64,
        balance_modification: f64,
        is_currency: bool,
    ) -> InstrumentationResult<()> {
        self.send(
            DataPointBuilder::new("datacollector_updateCollection")
                .arg(name)
                .arg(balance)
                .arg(balance_modification)
                .arg(is_currency),
        )
    }

    pub fn new_user(&self) -> InstrumentationResult<()> {
        self.send(DataPointBuilder::new("datacollector_newUser"))
    }

    pub fn new_device(&self) -> InstrumentationResult<()> {
        self.send(DataPointBuilder::new("datacollector_newDevice"))
    }

    /// Build a data point for the current user/device and store it.
    pub fn send(&self, builder: DataPointBuilder) -> InstrumentationResult<()> {
        let ids = self.ids.read().clone();
        if ids.valid_device_id().is_none() {
            error!(method = builder.method(), "No device id set, dropping data point");
            return Err(InstrumentationError::MissingId);
        }

        debug!(method = builder.method(), "Storing data point");
        let event = builder.build(&ids, micro_timestamp());
        self.depot.store(event)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_depot::DepotError;

    #[test]
    fn test_missing_device_id() {
        let instrumentation = Instrumentation::new(EventDepot::new(), "");
        assert!(matches!(
            instrumentation.new_user(),
            Err(InstrumentationError::MissingId)
        ));
    }

    #[test]
    fn test_uninitialized_depot() {
        let instrumentation = Instrumentation::new(EventDepot::new(), "device-1");
        assert!(matches!(
            instrumentation.new_device(),
            Err(InstrumentationError::Depot(DepotError::NotInitialized))
        ));
    }

    #[test]
    fn test_progress_out_of_range() {
        let instrumentation = Instrumentation::new(EventDepot::new(), "device-1");
        assert!(matches!(
            instrumentation.update_transaction("level", 101, None, &Properties::new()),
            Err(InstrumentationError::InvalidArgs(_))
        ));
    }

    #[test]
    fn test_user_id_updates() {
        let instrumentation = Instrumentation::new(EventDepot::new(), "device-1");
        assert_eq!(instrumentation.user_id(), None);

        instrumentation.clone().set_user_id(Some("user-9".to_string()));
        assert_eq!(instrumentation.user_id().as_deref(), Some("user-9"));
        assert_eq!(instrumentation.device_id().as_deref(), Some("device-1"));
    }
}
