//! Configuration, paths, error taxonomy and small utilities shared by the
//! Splyt crates.

mod config;
mod error;
mod logging;
mod paths;
mod timestamp;

pub use config::{
    CollectorSettings, Config, DEFAULT_HOST, DEFAULT_LOG_LEVEL, DEFAULT_REQUEST_TIMEOUT_MS,
    DEFAULT_SDK_NAME, DEFAULT_WS_VERSION, DATACOLLECTOR_BATCH_PATH,
};
pub use error::{CoreError, CoreResult, SplytError};
pub use logging::init_logging;
pub use paths::Paths;
pub use timestamp::micro_timestamp;
