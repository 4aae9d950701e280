//! Single consumer of the job queue. Owns the depot state.

use crate::archive::PersistentArchive;
use crate::depot::{DepotConfig, DepotLifecycle, DepotStatus};
use crate::job::DepotJob;
use crate::processor::{BinLimits, BinProcessor, TickReport};
use crate::scheduler::TickScheduler;
use crate::state::DepotState;
use crate::store::BlobStore;
use crate::throttle::ProcessPeriod;
use crate::Event;
use splyt_transport::Transport;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, WeakUnboundedSender};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use url::Url;

pub(crate) struct DepotWorker {
    processor: BinProcessor,
    state: DepotState,
    url: Url,
    scheduler: TickScheduler,
    lifecycle: Arc<watch::Sender<DepotLifecycle>>,
}

impl DepotWorker {
    pub(crate) fn new(
        config: &DepotConfig,
        store: Box<dyn BlobStore>,
        transport: Arc<dyn Transport>,
        jobs: WeakUnboundedSender<DepotJob>,
        lifecycle: Arc<watch::Sender<DepotLifecycle>>,
    ) -> Self {
        let processor = BinProcessor::new(
            PersistentArchive::new(store),
            transport,
            ProcessPeriod::new(config.period_min, config.period_max),
            BinLimits {
                max_events_per_bin: config.max_events_per_bin,
                archive_capacity: config.archive_capacity,
            },
            config.request_timeout,
        );

        Self {
            processor,
            state: DepotState::new(config.url.clone()),
            url: config.url.clone(),
            scheduler: TickScheduler::new(jobs),
            lifecycle,
        }
    }

    /// Consume jobs until shutdown or until every handle is dropped.
    pub(crate) async fn run(mut self, mut jobs: UnboundedReceiver<DepotJob>) {
        debug!("Depot worker started");

        while let Some(job) = jobs.recv().await {
            let name = job.name();
            if self.handle(job).await.is_break() {
                info!("Depot worker stopped");
                return;
            }
            debug!(job = name, pending = jobs.len(), "Job complete");
        }

        // Every handle dropped without a shutdown.
        self.scheduler.cancel();
        if self.has_unsaved_state() {
            self.checkpoint();
        }
        self.set_lifecycle(DepotLifecycle::Stopped);
        info!("Depot worker stopped, all handles dropped");
    }

    async fn handle(&mut self, job: DepotJob) -> ControlFlow<()> {
        match job {
            DepotJob::Init => self.init().await,
            DepotJob::Store(event) => self.store(event).await,
            DepotJob::Pause => self.pause(),
            DepotJob::Resume => self.resume(),
            DepotJob::Tick {
                flush_holding_bin,
                scheduled: true,
            } => self.scheduled_tick(flush_holding_bin).await,
            DepotJob::Tick {
                flush_holding_bin, ..
            } => self.explicit_tick(flush_holding_bin).await,
            DepotJob::Status(reply) => {
                let _ = reply.send(self.status());
            }
            DepotJob::Drain(reply) => {
                let _ = reply.send(());
            }
            DepotJob::Shutdown(reply) => {
                self.shutdown();
                let _ = reply.send(());
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    async fn init(&mut self) {
        if self.lifecycle() != DepotLifecycle::Initializing {
            warn!(lifecycle = ?self.lifecycle(), "Ignoring duplicate init");
            return;
        }

        self.restore();

        // Events bound for a different collector must not mix with new ones.
        let flush = self.state.holding_bin_url() != &self.url;
        if flush {
            info!(
                previous = %self.state.holding_bin_url(),
                current = %self.url,
                "Collector URL changed, flushing holding bin"
            );
        }
        self.tick(flush).await;
        self.state.set_holding_bin_url(self.url.clone());

        self.scheduler.schedule(self.processor.period().current());
        self.set_lifecycle(DepotLifecycle::Running);
    }

    async fn store(&mut self, event: Event) {
        if self.lifecycle() == DepotLifecycle::Paused {
            self.restore();
            self.state.holding_bin_mut().push(event);
            self.tick(false).await;
            self.checkpoint();
            return;
        }

        self.state.holding_bin_mut().push(event);
        if self.state.holding_bin().len() >= self.processor.limits().max_events_per_bin {
            self.tick(false).await;
        }
    }

    fn pause(&mut self) {
        if self.lifecycle() != DepotLifecycle::Running {
            debug!(lifecycle = ?self.lifecycle(), "Ignoring pause");
            return;
        }

        self.scheduler.cancel();
        self.checkpoint();
        self.set_lifecycle(DepotLifecycle::Paused);
    }

    fn resume(&mut self) {
        if self.lifecycle() != DepotLifecycle::Paused {
            debug!(lifecycle = ?self.lifecycle(), "Ignoring resume");
            return;
        }

        self.restore();
        self.processor.period_mut().reset();
        self.scheduler.schedule(self.processor.period().current());
        self.set_lifecycle(DepotLifecycle::Running);
    }

    async fn scheduled_tick(&mut self, flush: bool) {
        // A timer that fired just before pause or shutdown.
        if self.lifecycle() != DepotLifecycle::Running {
            debug!(lifecycle = ?self.lifecycle(), "Ignoring scheduled tick");
            return;
        }

        self.tick(flush).await;
        self.scheduler.schedule(self.processor.period().current());
    }

    async fn explicit_tick(&mut self, flush: bool) {
        if self.lifecycle() == DepotLifecycle::Paused {
            self.restore();
            self.tick(flush).await;
            self.checkpoint();
        } else {
            self.tick(flush).await;
        }
    }

    fn shutdown(&mut self) {
        self.scheduler.cancel();
        if self.has_unsaved_state() {
            self.checkpoint();
        }
        self.set_lifecycle(DepotLifecycle::Stopped);
    }

    async fn tick(&mut self, flush: bool) -> TickReport {
        let report = self.processor.process_tick(&mut self.state, flush).await;
        if report.evicted > 0 || report.dropped_events > 0 || report.skipped_slots > 0 {
            warn!(
                evicted = report.evicted,
                dropped_events = report.dropped_events,
                skipped_slots = report.skipped_slots,
                "Tick lost data"
            );
        }
        debug!(
            attempted = ?report.attempted,
            delivered = report.delivered,
            archived = report.archived,
            period_ms = self.processor.period().current().as_millis() as u64,
            "Tick complete"
        );
        report
    }

    /// Load the checkpoint, if any, and remove it from storage.
    ///
    /// Without a checkpoint the in-memory state is kept. When the archive is
    /// empty afterwards, leftover slots from an abnormal exit are deleted.
    fn restore(&mut self) {
        let capacity = self.processor.limits().archive_capacity;
        let archive = self.processor.archive();

        if let Some(checkpoint) = archive.read_checkpoint() {
            self.state = checkpoint.into_state(&self.url, capacity);
            debug!(
                resend = self.state.resend_bin().len(),
                holding = self.state.holding_bin().len(),
                archive_start = self.state.archive_start(),
                archive_end = self.state.archive_end(),
                "Restored depot state"
            );
        }
        if let Err(e) = archive.delete_checkpoint() {
            error!(error = %e, "Failed to delete depot checkpoint");
        }

        if !self.state.archive_is_empty() {
            return;
        }
        match archive.list_stale_slots() {
            Ok(stale) => {
                if !stale.is_empty() {
                    warn!(count = stale.len(), "Deleting stale archive slots");
                }
                for index in stale {
                    if let Err(e) = archive.delete_slot(index) {
                        error!(index, error = %e, "Failed to delete stale archive slot");
                    }
                }
            }
            Err(e) => error!(error = %e, "Failed to list archive slots"),
        }
    }

    /// Persist the state and clear it from memory.
    ///
    /// On failure the state stays in memory.
    fn checkpoint(&mut self) {
        match self.processor.archive().write_checkpoint(&self.state) {
            Ok(()) => {
                debug!("Depot state checkpointed");
                self.state.reset(&self.url);
            }
            Err(e) => error!(error = %e, "Failed to checkpoint depot state"),
        }
    }

    /// Running state lives only in memory. While paused, a non-empty state
    /// means the pause checkpoint failed and the events were kept here.
    fn has_unsaved_state(&self) -> bool {
        self.lifecycle() == DepotLifecycle::Running || !self.state.is_empty()
    }

    fn status(&self) -> DepotStatus {
        let lifecycle = self.lifecycle();
        let capacity = self.processor.limits().archive_capacity;

        // While paused the live state sits in the checkpoint.
        let checkpointed = if lifecycle == DepotLifecycle::Paused {
            self.processor
                .archive()
                .read_checkpoint()
                .map(|checkpoint| checkpoint.into_state(&self.url, capacity))
        } else {
            None
        };
        let state = checkpointed.as_ref().unwrap_or(&self.state);

        DepotStatus {
            lifecycle,
            resend_bin_len: state.resend_bin().len(),
            holding_bin_len: state.holding_bin().len(),
            archived_bins: state.archived_bins(capacity),
            archive_start: state.archive_start(),
            archive_end: state.archive_end(),
            period: self.processor.period().current(),
        }
    }

    fn lifecycle(&self) -> DepotLifecycle {
        *self.lifecycle.borrow()
    }

    fn set_lifecycle(&self, lifecycle: DepotLifecycle) {
        let previous = self.lifecycle.send_replace(lifecycle);
        if previous != lifecycle {
            info!(from = ?previous, to = ?lifecycle, "Event depot lifecycle changed");
        }
    }
}
