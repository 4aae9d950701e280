//! Timer that feeds scheduled ticks into the job queue.

use crate::job::DepotJob;
use std::time::Duration;
use tokio::sync::mpsc::WeakUnboundedSender;
use tokio::task::JoinHandle;

/// At most one pending timer. The timer only enqueues a job; it never
/// touches depot state.
pub(crate) struct TickScheduler {
    jobs: WeakUnboundedSender<DepotJob>,
    timer: Option<JoinHandle<()>>,
}

impl TickScheduler {
    pub(crate) fn new(jobs: WeakUnboundedSender<DepotJob>) -> Self {
        Self { jobs, timer: None }
    }

    /// Arm the timer, replacing any pending one.
    ///
    /// Must be called from within a tokio runtime.
    pub(crate) fn schedule(&mut self, delay: Duration) {
        self.cancel();
        let jobs = self.jobs.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Handles gone means the depot is being torn down.
            if let Some(jobs) = jobs.upgrade() {
                let _ = jobs.send(DepotJob::Tick {
                    flush_holding_bin: false,
                    scheduled: true,
                });
            }
        }));
    }

    pub(crate) fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_schedule_enqueues_tick() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = TickScheduler::new(tx.downgrade());

        scheduler.schedule(Duration::from_millis(10));

        let job = timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
        assert!(matches!(
            job,
            DepotJob::Tick {
                flush_holding_bin: false,
                scheduled: true
            }
        ));
    }

    #[tokio::test]
    async fn test_cancel_prevents_tick() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = TickScheduler::new(tx.downgrade());

        scheduler.schedule(Duration::from_millis(20));
        scheduler.cancel();

        assert!(timeout(Duration::from_millis(100), rx.recv()).await.is_err());
    }

    #[tokio::test]
    async fn test_reschedule_keeps_single_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = TickScheduler::new(tx.downgrade());

        scheduler.schedule(Duration::from_millis(10));
        scheduler.schedule(Duration::from_millis(10));

        assert!(timeout(Duration::from_secs(2), rx.recv()).await.unwrap().is_some());
        assert!(timeout(Duration::from_millis(100), rx.recv()).await.is_err());
    }

    #[tokio::test]
    async fn test_no_tick_after_senders_dropped() {
        let (tx, mut rx) = mpsc::unbounded_channel::<DepotJob>();
        let mut scheduler = TickScheduler::new(tx.downgrade());
        drop(tx);

        scheduler.schedule(Duration::from_millis(5));

        assert!(rx.recv().await.is_none());
    }
}
