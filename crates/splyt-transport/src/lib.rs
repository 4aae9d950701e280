//! HTTP transport for delivering event batches to the data collector.
//!
//! This crate provides:
//! - Transport: the single-request contract the event depot sends through
//! - HttpTransport: reqwest-backed implementation with timeout classification

mod error;
mod http;

pub use error::{TransportError, TransportResult};
pub use http::HttpTransport;

use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// One POST of a JSON payload, no retries.
///
/// Implementations classify failures into [`TransportError`]; retry policy
/// belongs to the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `payload` to `url`, giving up after `timeout`.
    ///
    /// Returns the response body on success.
    async fn send(&self, url: &Url, timeout: Duration, payload: String) -> TransportResult<String>;
}
