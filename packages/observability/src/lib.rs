//! Tracing setup shared by the Splyt crates.
//!
//! Library crates only emit through the `tracing` macros. A binary calls
//! [`init`] once at startup and picks the outputs: compact lines on stderr,
//! a JSONL file, or both.
//!
//! ```rust,ignore
//! observability::init(
//!     observability::LogConfig::new("splyt")
//!         .level("debug")
//!         .jsonl("/tmp/splyt.jsonl"),
//! );
//! tracing::info!(events = 50, "holding bin full");
//! ```

mod file;
mod json_layer;

pub use file::LogFile;
pub use json_layer::{JsonLayer, LogEntry};

use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Where log output goes and how much of it.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Written into every JSONL line.
    pub service: String,
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    pub jsonl_path: Option<PathBuf>,
    pub stderr: bool,
}

impl LogConfig {
    /// `info` level, stderr only.
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            level: "info".into(),
            jsonl_path: None,
            stderr: true,
        }
    }

    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn jsonl(mut self, path: impl Into<PathBuf>) -> Self {
        self.jsonl_path = Some(path.into());
        self
    }

    pub fn stderr(mut self, enabled: bool) -> Self {
        self.stderr = enabled;
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level))
    }
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed; the first one
/// stays in place. A log file that cannot be opened is reported on stderr
/// and skipped.
pub fn init(config: LogConfig) -> bool {
    let file_layer = match config.jsonl_path.as_deref().map(LogFile::open) {
        Some(Ok(file)) => {
            Some(JsonLayer::new(config.service.clone(), file).with_filter(config.filter()))
        }
        Some(Err(e)) => {
            eprintln!("splyt: logging to stderr only, log file unavailable: {e}");
            None
        }
        None => None,
    };

    let stderr_layer = config.stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_filter(config.filter())
    });

    let installed = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(
            service = %config.service,
            level = %config.level,
            jsonl = ?config.jsonl_path,
            "Logging initialized"
        );
    }
    installed
}
