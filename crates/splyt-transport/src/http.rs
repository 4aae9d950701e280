//! reqwest-backed transport.

use crate::{Transport, TransportError, TransportResult};
use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error};
use url::Url;

/// HTTP transport for the data collector.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    pub fn new() -> TransportResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| TransportError::Generic(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Run a request on the current tokio runtime without waiting for it.
    ///
    /// The returned handle resolves to the same outcome [`Transport::send`]
    /// would produce.
    pub fn spawn_send(
        &self,
        url: Url,
        timeout: Duration,
        payload: String,
    ) -> JoinHandle<TransportResult<String>> {
        let client = self.client.clone();
        tokio::spawn(async move { post(&client, &url, timeout, payload).await })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, url: &Url, timeout: Duration, payload: String) -> TransportResult<String> {
        post(&self.client, url, timeout, payload).await
    }
}

async fn post(client: &Client, url: &Url, timeout: Duration, payload: String) -> TransportResult<String> {
    debug!(url = %url, bytes = payload.len(), "Sending request");

    let response = client
        .post(url.clone())
        .timeout(timeout)
        .header(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded; charset=utf-8",
        )
        .header(header::CONNECTION, "close")
        .header("ssf-use-positional-post-params", "true")
        .header("ssf-contents-not-url-encoded", "true")
        .body(payload)
        .send()
        .await
        .map_err(classify)?;

    let status = response.status();
    if status != StatusCode::OK {
        error!(url = %url, status = %status, "Unexpected HTTP status");
        return Err(TransportError::Generic(format!("HTTP {status}")));
    }

    response.text().await.map_err(classify)
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        error!("Request timed out. Try increasing the request timeout");
        TransportError::Timeout
    } else if err.is_connect() || err.is_request() || err.is_body() {
        error!(error = %err, "Request IO error");
        TransportError::Io(err.to_string())
    } else {
        error!(error = %err, "Request failed");
        TransportError::Generic(err.to_string())
    }
}
