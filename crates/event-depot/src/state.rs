//! In-memory working state of the depot.

use crate::Event;
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

/// The depot's complete working set.
///
/// Owned by the worker; nothing outside the job queue touches it.
#[derive(Debug, Clone, PartialEq)]
pub struct DepotState {
    resend_bin: Vec<Event>,
    resend_bin_url: Url,
    holding_bin: Vec<Event>,
    holding_bin_url: Url,
    archive_start: usize,
    archive_end: usize,
}

impl DepotState {
    /// Empty state bound to `url`.
    pub fn new(url: Url) -> Self {
        Self {
            resend_bin: Vec::new(),
            resend_bin_url: url.clone(),
            holding_bin: Vec::new(),
            holding_bin_url: url,
            archive_start: 0,
            archive_end: 0,
        }
    }

    /// Reinitialize every field, binding both bins to `url`.
    pub fn reset(&mut self, url: &Url) {
        *self = Self::new(url.clone());
    }

    pub fn resend_bin(&self) -> &[Event] {
        &self.resend_bin
    }

    pub fn resend_bin_mut(&mut self) -> &mut Vec<Event> {
        &mut self.resend_bin
    }

    pub fn resend_bin_url(&self) -> &Url {
        &self.resend_bin_url
    }

    pub fn set_resend_bin_url(&mut self, url: Url) {
        self.resend_bin_url = url;
    }

    pub fn holding_bin(&self) -> &[Event] {
        &self.holding_bin
    }

    pub fn holding_bin_mut(&mut self) -> &mut Vec<Event> {
        &mut self.holding_bin
    }

    pub fn holding_bin_url(&self) -> &Url {
        &self.holding_bin_url
    }

    pub fn set_holding_bin_url(&mut self, url: Url) {
        self.holding_bin_url = url;
    }

    pub fn archive_start(&self) -> usize {
        self.archive_start
    }

    pub fn set_archive_start(&mut self, index: usize) {
        self.archive_start = index;
    }

    pub fn archive_end(&self) -> usize {
        self.archive_end
    }

    pub fn set_archive_end(&mut self, index: usize) {
        self.archive_end = index;
    }

    /// Whether the circular archive holds no bins.
    pub fn archive_is_empty(&self) -> bool {
        self.archive_start == self.archive_end
    }

    /// Number of bins between `start` and `end` for a buffer of `capacity` slots.
    pub fn archived_bins(&self, capacity: usize) -> usize {
        bins_between(self.archive_start, self.archive_end, capacity)
    }

    /// No events in memory and nothing archived.
    pub fn is_empty(&self) -> bool {
        self.resend_bin.is_empty() && self.holding_bin.is_empty() && self.archive_is_empty()
    }
}

/// Serialized form of [`DepotState`] written across pause/resume.
///
/// URLs are optional so snapshots written without them still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    #[serde(default)]
    pub resend_bin: Vec<Event>,
    #[serde(default)]
    pub resend_bin_url: Option<Url>,
    #[serde(default)]
    pub holding_bin: Vec<Event>,
    #[serde(default)]
    pub holding_bin_url: Option<Url>,
    #[serde(default)]
    pub archive_start: usize,
    #[serde(default)]
    pub archive_end: usize,
}

impl Checkpoint {
    pub fn from_state(state: &DepotState) -> Self {
        Self {
            resend_bin: state.resend_bin.clone(),
            resend_bin_url: Some(state.resend_bin_url.clone()),
            holding_bin: state.holding_bin.clone(),
            holding_bin_url: Some(state.holding_bin_url.clone()),
            archive_start: state.archive_start,
            archive_end: state.archive_end,
        }
    }

    /// `(start, end)` when both indices fit an archive of `capacity` slots.
    pub fn archive_range(&self, capacity: usize) -> Option<(usize, usize)> {
        (self.archive_start < capacity && self.archive_end < capacity)
            .then_some((self.archive_start, self.archive_end))
    }

    /// Bins the restored state would report. Out-of-range indices count as
    /// an empty archive.
    pub fn archived_bins(&self, capacity: usize) -> usize {
        self.archive_range(capacity)
            .map_or(0, |(start, end)| bins_between(start, end, capacity))
    }

    /// Rebuild working state.
    ///
    /// Missing URLs fall back to `url`. Archive indices outside
    /// `[0, capacity)` cannot be trusted, so the archive is treated as empty.
    pub fn into_state(self, url: &Url, capacity: usize) -> DepotState {
        let (archive_start, archive_end) = self.archive_range(capacity).unwrap_or_else(|| {
            warn!(
                start = self.archive_start,
                end = self.archive_end,
                capacity,
                "Checkpoint archive indices out of range, discarding archive"
            );
            (0, 0)
        });

        DepotState {
            resend_bin: self.resend_bin,
            resend_bin_url: self.resend_bin_url.unwrap_or_else(|| url.clone()),
            holding_bin: self.holding_bin,
            holding_bin_url: self.holding_bin_url.unwrap_or_else(|| url.clone()),
            archive_start,
            archive_end,
        }
    }
}

fn bins_between(start: usize, end: usize, capacity: usize) -> usize {
    (end + capacity - start) % capacity
}
