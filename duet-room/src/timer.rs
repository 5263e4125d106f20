use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

const TICK: Duration = Duration::from_secs(1);

/// Countdown started once per room view, in whole seconds.
///
/// Runs on its own task and only ever writes its remaining-seconds value; the
/// room reads it for display. Dropping the timer stops the tick.
pub struct RoundTimer {
    remaining_rx: watch::Receiver<u64>,
    task: JoinHandle<()>,
}

impl RoundTimer {
    /// Starts counting down from `duration` (rounded up to whole seconds).
    /// `on_complete` runs once when the count reaches zero, unless the timer
    /// was cancelled first. Must be called from within a Tokio runtime.
    pub fn start<F>(duration: Duration, on_complete: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let total = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
        let (remaining_tx, remaining_rx) = watch::channel(total);

        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + TICK, TICK);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

            let mut remaining = total;
            while remaining > 0 {
                ticker.tick().await;
                remaining -= 1;
                remaining_tx.send_replace(remaining);
            }
            debug!("Round timer elapsed");
            on_complete();
        });

        Self { remaining_rx, task }
    }

    pub fn remaining(&self) -> u64 {
        *self.remaining_rx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.remaining_rx.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the countdown. The completion callback will not run afterwards.
    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl Drop for RoundTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// `mm:ss` rendering of a remaining-seconds value.
pub fn format_clock(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
