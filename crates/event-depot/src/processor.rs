//! The per-tick delivery algorithm.
//!
//! Each tick attempts at most one send, choosing the oldest undelivered
//! data first: resend bin, then the archive, then the holding bin. After
//! that, full chunks of the holding bin are rotated out to the archive.

use crate::archive::PersistentArchive;
use crate::response::CollectorResponse;
use crate::state::DepotState;
use crate::throttle::ProcessPeriod;
use crate::Event;
use splyt_config_and_utils::micro_timestamp;
use splyt_transport::Transport;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

/// Sizing of bins and of the circular archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinLimits {
    /// Events per bin; reaching it in the holding bin forces archival.
    pub max_events_per_bin: usize,
    /// Number of archive slots. At most `archive_capacity - 1` bins are held.
    pub archive_capacity: usize,
}

/// Which bin a tick tried to deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinSource {
    Resend,
    Archive { index: usize },
    Holding,
}

/// Outcome of one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Bin handed to the transport, if any.
    pub attempted: Option<BinSource>,
    /// Whether the attempted bin was accepted at the HTTP level.
    pub delivered: bool,
    /// Archive slots that could not be read and were dropped.
    pub skipped_slots: usize,
    /// Bins written to the archive by overflow handling.
    pub archived: usize,
    /// Oldest archived bins dropped to make room.
    pub evicted: usize,
    /// Events lost because their archive write failed.
    pub dropped_events: usize,
}

/// Runs ticks against a [`DepotState`].
///
/// Holds the archive, the transport and the adaptive period; the state
/// itself is owned by the caller.
pub struct BinProcessor {
    archive: PersistentArchive,
    transport: Arc<dyn Transport>,
    period: ProcessPeriod,
    limits: BinLimits,
    request_timeout: Duration,
}

impl BinProcessor {
    pub fn new(
        archive: PersistentArchive,
        transport: Arc<dyn Transport>,
        period: ProcessPeriod,
        limits: BinLimits,
        request_timeout: Duration,
    ) -> Self {
        Self {
            archive,
            transport,
            period,
            limits,
            request_timeout,
        }
    }

    pub fn archive(&self) -> &PersistentArchive {
        &self.archive
    }

    pub fn period(&self) -> &ProcessPeriod {
        &self.period
    }

    pub fn period_mut(&mut self) -> &mut ProcessPeriod {
        &mut self.period
    }

    pub fn limits(&self) -> BinLimits {
        self.limits
    }

    /// Run one tick.
    ///
    /// With `flush_holding_bin`, every event left in the holding bin is
    /// archived, not just full chunks.
    pub async fn process_tick(
        &mut self,
        state: &mut DepotState,
        flush_holding_bin: bool,
    ) -> TickReport {
        debug!(
            resend = state.resend_bin().len(),
            holding = state.holding_bin().len(),
            archive_start = state.archive_start(),
            archive_end = state.archive_end(),
            "Processing bins"
        );

        let mut report = TickReport::default();

        if !state.resend_bin().is_empty() {
            report.attempted = Some(BinSource::Resend);
            let url = state.resend_bin_url().clone();
            report.delivered = self.send_bin(&url, state.resend_bin()).await;
            if report.delivered {
                state.resend_bin_mut().clear();
            }
        } else if !state.archive_is_empty() {
            self.process_archive_slot(state, &mut report).await;
        } else if !state.holding_bin().is_empty() {
            report.attempted = Some(BinSource::Holding);
            let url = state.holding_bin_url().clone();
            let events = std::mem::take(state.holding_bin_mut());
            report.delivered = self.send_bin(&url, &events).await;
            if !report.delivered {
                state.resend_bin_mut().extend(events);
                state.set_resend_bin_url(url);
            }
        }

        self.handle_overflow(state, flush_holding_bin, &mut report);
        report
    }

    async fn process_archive_slot(&mut self, state: &mut DepotState, report: &mut TickReport) {
        let index = state.archive_start();

        match self.archive.read_slot(index) {
            Ok(bin) => {
                report.attempted = Some(BinSource::Archive { index });
                report.delivered = self.send_bin(&bin.url, &bin.events).await;
                if !report.delivered {
                    state.resend_bin_mut().extend(bin.events);
                    state.set_resend_bin_url(bin.url);
                }
            }
            Err(e) => {
                error!(index, error = %e, "Failed to load archived bin, skipping");
                report.skipped_slots += 1;
            }
        }

        if let Err(e) = self.archive.delete_slot(index) {
            error!(index, error = %e, "Failed to delete archived bin");
        }
        state.set_archive_start(self.next_index(index));
    }

    /// Rotate the front of the holding bin into the archive.
    fn handle_overflow(&mut self, state: &mut DepotState, flush: bool, report: &mut TickReport) {
        let max = self.limits.max_events_per_bin;

        while state.holding_bin().len() >= max || (flush && !state.holding_bin().is_empty()) {
            let take = state.holding_bin().len().min(max);
            let chunk: Vec<Event> = state.holding_bin_mut().drain(..take).collect();
            let index = state.archive_end();

            state.set_archive_end(self.next_index(index));
            if state.archive_is_empty() {
                let oldest = state.archive_start();
                warn!(index = oldest, "Archive full, dropping oldest bin");
                if let Err(e) = self.archive.delete_slot(oldest) {
                    error!(index = oldest, error = %e, "Failed to delete evicted bin");
                }
                state.set_archive_start(self.next_index(oldest));
                report.evicted += 1;
            }

            match self
                .archive
                .write_slot(index, state.holding_bin_url(), &chunk)
            {
                Ok(()) => report.archived += 1,
                Err(e) => {
                    error!(index, events = chunk.len(), error = %e, "Failed to write archive data");
                    report.dropped_events += chunk.len();
                }
            }
        }
    }

    /// Send one bin and adjust the period. Returns whether it was delivered.
    async fn send_bin(&mut self, url: &Url, events: &[Event]) -> bool {
        let payload = match serde_json::to_string(&(micro_timestamp(), events)) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "Failed to encode bin");
                self.period.record_failure();
                return false;
            }
        };

        match self.transport.send(url, self.request_timeout, payload).await {
            Ok(body) => {
                self.period.record_success();
                CollectorResponse::parse(&body).log();
                debug!(events = events.len(), period_ms = self.period_ms(), "Bin delivered");
                true
            }
            Err(e) => {
                self.period.record_failure();
                warn!(
                    events = events.len(),
                    error = %e,
                    period_ms = self.period_ms(),
                    "Failed to send bin"
                );
                false
            }
        }
    }

    fn next_index(&self, index: usize) -> usize {
        (index + 1) % self.limits.archive_capacity
    }

    fn period_ms(&self) -> u128 {
        self.period.current().as_millis()
    }
}
