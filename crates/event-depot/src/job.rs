//! Jobs consumed by the depot worker.

use crate::depot::DepotStatus;
use crate::Event;
use tokio::sync::oneshot;

/// One unit of work for the worker. Jobs run strictly in submission order.
#[derive(Debug)]
pub(crate) enum DepotJob {
    /// Restore persisted state and start the scheduler.
    Init,
    /// Append an event to the holding bin.
    Store(Event),
    Pause,
    Resume,
    /// Run the bin processor.
    Tick {
        flush_holding_bin: bool,
        /// Enqueued by the timer rather than a caller.
        scheduled: bool,
    },
    Status(oneshot::Sender<DepotStatus>),
    /// Replies once every earlier job has run.
    Drain(oneshot::Sender<()>),
    /// Checkpoint and stop the worker.
    Shutdown(oneshot::Sender<()>),
}

impl DepotJob {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Store(_) => "store",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Tick {
                scheduled: true, ..
            } => "scheduled_tick",
            Self::Tick { .. } => "tick",
            Self::Status(_) => "status",
            Self::Drain(_) => "drain",
            Self::Shutdown(_) => "shutdown",
        }
    }
}
