//! Instrumentation API for the Splyt SDK.
//!
//! This crate provides:
//! - DataPointBuilder: turns a collector call into a depot event
//! - Instrumentation: transactions, user/device state and collections
//! - Transaction: accumulates properties across begin/update/end

mod data_point;
mod error;
mod instrumentation;
mod transaction;

pub use data_point::{DataPointBuilder, EntityIds, Properties};
pub use error::{InstrumentationError, InstrumentationResult};
pub use instrumentation::Instrumentation;
pub use transaction::{
    Transaction, TIMEOUT_MODE_ANY, TIMEOUT_MODE_TRANSACTION, TXN_ERROR, TXN_SUCCESS,
};
