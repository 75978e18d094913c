//! Periodic removal of expired cache entries

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::domain::cache::EmbeddingCache;

/// Handle to a running sweep task
///
/// Dropping the handle without calling [`SweeperHandle::shutdown`] leaves the
/// task running until the runtime stops.
#[derive(Debug)]
pub struct SweeperHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    /// Stop the task and wait for it to exit
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);

        if let Err(e) = self.task.await {
            warn!(error = %e, "Cache sweeper task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Run `sweep_expired` on `cache` every `interval`
pub fn spawn_sweeper(cache: Arc<dyn EmbeddingCache>, interval: Duration) -> SweeperHandle {
    let (stop, mut stopped) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => match cache.sweep_expired() {
                    Ok(0) => {}
                    Ok(removed) => debug!(removed, "Swept expired embedding cache entries"),
                    Err(e) => warn!(error = %e, "Embedding cache sweep failed"),
                },
                changed = stopped.changed() => {
                    if changed.is_err() || *stopped.borrow() {
                        break;
                    }
                }
            }
        }

        debug!("Cache sweeper stopped");
    });

    SweeperHandle { stop, task }
}
