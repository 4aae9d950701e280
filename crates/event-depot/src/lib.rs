//! # Event Depot
//!
//! Durable, rate-limited, ordered delivery of telemetry events to the Splyt
//! data collector.
//!
//! ## Overview
//!
//! Callers hand events to an [`EventDepot`]. Every operation becomes a job
//! on a single unbounded queue consumed by one dedicated worker thread, so
//! the depot state needs no locks and jobs run in submission order.
//!
//! ```text
//! store(event) ──┐
//! pause/resume ──┼──▶ job queue ──▶ worker ──▶ BinProcessor ──▶ Transport
//! timer ─────────┘                    │
//!                                     ▼
//!                            PersistentArchive (BlobStore)
//! ```
//!
//! Each tick sends at most one bin, oldest data first: the resend bin, then
//! the circular on-disk archive, then the holding bin. Full chunks of the
//! holding bin are rotated into the archive. The tick period backs off
//! while sends fail and recovers once they succeed.
//!
//! ## Example
//!
//! ```ignore
//! use event_depot::{DepotConfig, Event, EventDepot, FileBlobStore};
//! use splyt_transport::HttpTransport;
//! use std::sync::Arc;
//!
//! let depot = EventDepot::new();
//! depot.init(
//!     DepotConfig::from_settings(config.collector_settings()?),
//!     Box::new(FileBlobStore::open(paths.depot_dir())?),
//!     Arc::new(HttpTransport::new()?),
//! )?;
//!
//! depot.store(Event::new("datacollector_newUser", args))?;
//! depot.shutdown().await?;
//! ```

mod archive;
mod depot;
mod error;
mod event;
mod job;
mod processor;
mod response;
mod scheduler;
mod state;
mod store;
mod throttle;
mod worker;

pub use archive::{ArchivedBin, PersistentArchive, BIN_ARCHIVE_PREFIX, STATE_KEY};
pub use depot::{
    DepotConfig, DepotLifecycle, DepotStatus, EventDepot, DEFAULT_ARCHIVE_CAPACITY,
    DEFAULT_MAX_EVENTS_PER_BIN, DEFAULT_PERIOD_MAX, DEFAULT_PERIOD_MIN,
};
pub use error::{ArchiveError, ArchiveResult, DepotError, DepotResult};
pub use event::Event;
pub use processor::{BinLimits, BinProcessor, BinSource, TickReport};
pub use response::CollectorResponse;
pub use state::{Checkpoint, DepotState};
pub use store::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use throttle::ProcessPeriod;
