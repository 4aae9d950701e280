//! Logging setup for the Splyt binaries.

use observability::LogConfig;
use std::path::PathBuf;

/// Install the process-wide subscriber.
///
/// Compact lines always go to stderr. `jsonl` adds a structured copy of
/// every event; `RUST_LOG` overrides `level`.
pub fn init_logging(level: &str, jsonl: Option<PathBuf>) {
    let mut config = LogConfig::new("splyt").level(level);
    if let Some(path) = jsonl {
        config = config.jsonl(path);
    }
    observability::init(config);
}
