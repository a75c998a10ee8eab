//! Polling for file changes.

use crate::model::FileDocument;
use crate::Figsync;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Default polling interval.
pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_millis(5_000);

/// Shortest polling interval; shorter requests are raised to this.
pub const MIN_WATCH_INTERVAL: Duration = Duration::from_millis(1);

/// Handle to a running watch. Polling continues until [`cancel`](Self::cancel).
#[derive(Debug)]
pub struct WatchHandle {
    task: JoinHandle<()>,
}

impl WatchHandle {
    /// Stop polling.
    pub fn cancel(&self) {
        self.task.abort();
    }

    /// Check if the poll loop has stopped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Poll `file_id` every `interval`, bypassing the cache, and call `callback`
/// with `(current, previous)` whenever the file's revision changes.
pub(crate) fn spawn<F>(
    client: Figsync,
    file_id: String,
    interval: Duration,
    mut callback: F,
) -> WatchHandle
where
    F: FnMut(&FileDocument, &FileDocument) + Send + 'static,
{
    let interval = interval.max(MIN_WATCH_INTERVAL);
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut previous: Option<Arc<FileDocument>> = None;

        loop {
            ticker.tick().await;
            let file = match client.file(&file_id, false).await {
                Ok(file) => file,
                Err(err) => {
                    log::warn!("Polling file {} failed: {}", file_id, err);
                    continue;
                }
            };

            if let Some(previous) = &previous {
                if previous.revision() != file.revision() {
                    log::debug!("File {} changed", file_id);
                    callback(&file, previous);
                }
            }
            previous = Some(file);
        }
    });

    WatchHandle { task }
}
