//! Configuration management for the SDK.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default data collector host.
pub const DEFAULT_HOST: &str = "https://data.splyt.com";

/// Path of the batch endpoint on the data collector.
pub const DATACOLLECTOR_BATCH_PATH: &str = "/isos-personalization/ws/interface/datacollector_batch";

/// Web service version sent with every request.
pub const DEFAULT_WS_VERSION: &str = "4";

/// SDK name reported to the collector.
pub const DEFAULT_SDK_NAME: &str = "rust";

/// Default timeout for web requests, in milliseconds.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 3000;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// SDK configuration, stored as `config.json` under the SDK root.
///
/// Missing keys take their defaults, so a file holding only
/// `{"customer_id": "..."}` is complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Filter directive for the log subscriber.
    pub log_level: String,
    /// Collector host with scheme, e.g. `https://data.splyt.com`.
    pub host: String,
    pub customer_id: String,
    pub sdk_name: String,
    pub sdk_version: String,
    pub ws_version: String,
    pub request_timeout_ms: u64,
}

/// Everything the event depot needs to reach the collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorSettings {
    /// Batch endpoint, query parameters included.
    pub url: Url,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            host: DEFAULT_HOST.to_string(),
            customer_id: String::new(),
            sdk_name: DEFAULT_SDK_NAME.to_string(),
            sdk_version: env!("CARGO_PKG_VERSION").to_string(),
            ws_version: DEFAULT_WS_VERSION.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl Config {
    /// Read `config.json` if present, then apply `SPLYT_*` environment
    /// overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let file = paths.config_file();
        let mut config = if file.exists() {
            debug!(path = %file.display(), "Loading config file");
            Self::load_from_file(&file)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        Ok(serde_json::from_slice(&std::fs::read(path)?)?)
    }

    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        std::fs::write(paths.config_file(), serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    fn apply_env(&mut self) {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        if let Some(level) = var("SPLYT_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(host) = var("SPLYT_HOST") {
            self.host = host;
        }
        if let Some(customer_id) = var("SPLYT_CUSTOMER_ID") {
            self.customer_id = customer_id;
        }
        match var("SPLYT_REQUEST_TIMEOUT_MS").map(|raw| raw.trim().parse::<u64>()) {
            Some(Ok(ms)) => self.request_timeout_ms = ms,
            Some(Err(e)) => warn!(error = %e, "Ignoring invalid SPLYT_REQUEST_TIMEOUT_MS"),
            None => {}
        }
    }

    /// Query string appended to every collector request.
    pub fn query_params(&self) -> String {
        format!(
            "?ssf_ws_version={}&ssf_cust_id={}&ssf_output=json&ssf_sdk={}&ssf_sdk_version={}",
            self.ws_version, self.customer_id, self.sdk_name, self.sdk_version
        )
    }

    /// Build the collector endpoint and request timeout.
    pub fn collector_settings(&self) -> CoreResult<CollectorSettings> {
        if self.customer_id.trim().is_empty() {
            return Err(CoreError::Config("customer_id is required".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(CoreError::Config(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }

        let raw = format!(
            "{}{}{}",
            self.host.trim_end_matches('/'),
            DATACOLLECTOR_BATCH_PATH,
            self.query_params()
        );
        let url = Url::parse(&raw)?;

        Ok(CollectorSettings {
            url,
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        })
    }
}
