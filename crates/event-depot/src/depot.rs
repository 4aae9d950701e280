//! Public handle to the event depot.

use crate::job::DepotJob;
use crate::store::BlobStore;
use crate::worker::DepotWorker;
use crate::{DepotError, DepotResult, Event};
use parking_lot::Mutex;
use splyt_config_and_utils::CollectorSettings;
use splyt_transport::Transport;
use std::sync::{Arc, OnceLock};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{error, info, warn};
use url::Url;

/// Default number of events per bin.
pub const DEFAULT_MAX_EVENTS_PER_BIN: usize = 50;

/// Default number of archive slots (200 archived bins).
pub const DEFAULT_ARCHIVE_CAPACITY: usize = 201;

/// Default fastest tick period.
pub const DEFAULT_PERIOD_MIN: Duration = Duration::from_millis(5000);

/// Default slowest tick period.
pub const DEFAULT_PERIOD_MAX: Duration = Duration::from_millis(30000);

const WORKER_THREAD_NAME: &str = "event-depot";

/// Depot configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepotConfig {
    /// Collector batch endpoint, query parameters included.
    pub url: Url,
    /// Timeout for each send.
    pub request_timeout: Duration,
    pub max_events_per_bin: usize,
    pub archive_capacity: usize,
    pub period_min: Duration,
    pub period_max: Duration,
}

impl DepotConfig {
    /// Config with default sizing and periods.
    pub fn new(url: Url, request_timeout: Duration) -> Self {
        Self {
            url,
            request_timeout,
            max_events_per_bin: DEFAULT_MAX_EVENTS_PER_BIN,
            archive_capacity: DEFAULT_ARCHIVE_CAPACITY,
            period_min: DEFAULT_PERIOD_MIN,
            period_max: DEFAULT_PERIOD_MAX,
        }
    }

    pub fn from_settings(settings: CollectorSettings) -> Self {
        Self::new(settings.url, settings.request_timeout)
    }

    pub fn validate(&self) -> DepotResult<()> {
        if self.max_events_per_bin == 0 {
            return Err(DepotError::InvalidConfig(
                "max_events_per_bin must be greater than zero".to_string(),
            ));
        }
        if self.archive_capacity < 2 {
            return Err(DepotError::InvalidConfig(
                "archive_capacity must be at least 2".to_string(),
            ));
        }
        if self.request_timeout.is_zero() || self.period_min.is_zero() {
            return Err(DepotError::InvalidConfig(
                "request_timeout and period_min must be non-zero".to_string(),
            ));
        }
        if self.period_max < self.period_min {
            return Err(DepotError::InvalidConfig(
                "period_max must not be below period_min".to_string(),
            ));
        }
        Ok(())
    }
}

/// Depot lifecycle.
///
/// `Uninitialized -> Initializing -> Running <-> Paused`, and `Stopped`
/// once shut down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepotLifecycle {
    Uninitialized,
    Initializing,
    Running,
    Paused,
    Stopped,
}

/// Snapshot of the depot, taken by the worker between jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepotStatus {
    pub lifecycle: DepotLifecycle,
    pub resend_bin_len: usize,
    pub holding_bin_len: usize,
    pub archived_bins: usize,
    pub archive_start: usize,
    pub archive_end: usize,
    /// Delay before the next scheduled tick.
    pub period: Duration,
}

impl DepotStatus {
    /// Nothing left to deliver.
    pub fn is_idle(&self) -> bool {
        self.resend_bin_len == 0 && self.holding_bin_len == 0 && self.archived_bins == 0
    }
}

/// Handle to an event depot.
///
/// Cheap to clone; all clones drive the same worker. Every operation is a
/// job on one queue, consumed in order by a dedicated thread, so callers
/// never block on delivery. When the last handle is dropped the worker
/// checkpoints and exits.
#[derive(Clone)]
pub struct EventDepot {
    inner: Arc<Inner>,
}

struct Inner {
    jobs: OnceLock<mpsc::UnboundedSender<DepotJob>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    lifecycle: Arc<watch::Sender<DepotLifecycle>>,
}

impl Default for EventDepot {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDepot {
    /// Create an uninitialized depot.
    pub fn new() -> Self {
        let (lifecycle, _) = watch::channel(DepotLifecycle::Uninitialized);
        Self {
            inner: Arc::new(Inner {
                jobs: OnceLock::new(),
                worker: Mutex::new(None),
                lifecycle: Arc::new(lifecycle),
            }),
        }
    }

    /// Start the worker thread and queue state restoration.
    ///
    /// Calling it again on a running depot does nothing; a depot that has
    /// stopped cannot be restarted.
    pub fn init(
        &self,
        config: DepotConfig,
        store: Box<dyn BlobStore>,
        transport: Arc<dyn Transport>,
    ) -> DepotResult<()> {
        config.validate()?;

        let mut worker_slot = self.inner.worker.lock();
        if self.lifecycle() == DepotLifecycle::Stopped {
            return Err(DepotError::Stopped);
        }
        if self.inner.jobs.get().is_some() {
            warn!("Event depot already initialized");
            return Ok(());
        }

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(DepotJob::Init).map_err(|_| DepotError::Stopped)?;

        let worker = DepotWorker::new(
            &config,
            store,
            transport,
            tx.downgrade(),
            self.inner.lifecycle.clone(),
        );
        self.inner
            .lifecycle
            .send_replace(DepotLifecycle::Initializing);

        let lifecycle = self.inner.lifecycle.clone();
        let spawned = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime.block_on(worker.run(rx)),
                    Err(e) => {
                        error!(error = %e, "Failed to build depot runtime");
                        lifecycle.send_replace(DepotLifecycle::Stopped);
                    }
                }
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.inner
                    .lifecycle
                    .send_replace(DepotLifecycle::Uninitialized);
                return Err(DepotError::Spawn(e));
            }
        };

        let _ = self.inner.jobs.set(tx);
        *worker_slot = Some(handle);
        info!(
            url = %config.url,
            max_events_per_bin = config.max_events_per_bin,
            archive_capacity = config.archive_capacity,
            "Event depot initializing"
        );
        Ok(())
    }

    /// Queue an event for delivery.
    pub fn store(&self, event: Event) -> DepotResult<()> {
        self.submit(DepotJob::Store(event))
    }

    /// Stop ticking and checkpoint state. Ignored unless running.
    pub fn pause(&self) -> DepotResult<()> {
        self.submit(DepotJob::Pause)
    }

    /// Restore state and restart ticking at the fastest period. Ignored
    /// unless paused.
    pub fn resume(&self) -> DepotResult<()> {
        self.submit(DepotJob::Resume)
    }

    /// Queue an immediate tick.
    pub fn process_bins(&self, flush_holding_bin: bool) -> DepotResult<()> {
        self.submit(DepotJob::Tick {
            flush_holding_bin,
            scheduled: false,
        })
    }

    pub async fn status(&self) -> DepotResult<DepotStatus> {
        let (tx, rx) = oneshot::channel();
        self.submit(DepotJob::Status(tx))?;
        rx.await.map_err(|_| DepotError::Stopped)
    }

    /// Wait until every job queued before this call has run.
    pub async fn drain(&self) -> DepotResult<()> {
        let (tx, rx) = oneshot::channel();
        self.submit(DepotJob::Drain(tx))?;
        rx.await.map_err(|_| DepotError::Stopped)
    }

    /// Checkpoint, stop the worker and join its thread.
    ///
    /// Jobs queued after this call are dropped.
    pub async fn shutdown(&self) -> DepotResult<()> {
        let (tx, rx) = oneshot::channel();
        self.submit(DepotJob::Shutdown(tx))?;
        rx.await.map_err(|_| DepotError::Stopped)?;

        let handle = self.inner.worker.lock().take();
        if let Some(handle) = handle {
            tokio::task::spawn_blocking(move || handle.join())
                .await
                .map_err(|_| DepotError::WorkerPanicked)?
                .map_err(|_| DepotError::WorkerPanicked)?;
        }
        Ok(())
    }

    pub fn lifecycle(&self) -> DepotLifecycle {
        *self.inner.lifecycle.borrow()
    }

    pub fn subscribe_lifecycle(&self) -> watch::Receiver<DepotLifecycle> {
        self.inner.lifecycle.subscribe()
    }

    fn submit(&self, job: DepotJob) -> DepotResult<()> {
        let jobs = self.inner.jobs.get().ok_or(DepotError::NotInitialized)?;
        if self.lifecycle() == DepotLifecycle::Stopped {
            return Err(DepotError::Stopped);
        }
        jobs.send(job).map_err(|_| DepotError::Stopped)
    }
}
