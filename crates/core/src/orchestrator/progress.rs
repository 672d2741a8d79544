//! Progress reporting.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, trace};

use crate::batch::Command;

/// "`delta` more of `total` completed", emitted as work finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    /// Command the completed jobs belong to.
    pub command: Command,
    /// Jobs completed since the previous update.
    pub delta: usize,
    /// Jobs completed so far in this run.
    pub completed: usize,
    /// Jobs expected in this run.
    pub total: usize,
}

/// Receives progress updates. Must not block.
pub trait ProgressSink: Send + Sync {
    fn advance(&self, update: ProgressUpdate);
}

impl ProgressSink for mpsc::Sender<ProgressUpdate> {
    fn advance(&self, update: ProgressUpdate) {
        if let Err(e) = self.try_send(update) {
            trace!("Dropped progress update: {}", e);
        }
    }
}

impl ProgressSink for mpsc::UnboundedSender<ProgressUpdate> {
    fn advance(&self, update: ProgressUpdate) {
        if let Err(e) = self.send(update) {
            trace!("Dropped progress update: {}", e);
        }
    }
}

/// Sink that writes each update to the log at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn advance(&self, update: ProgressUpdate) {
        info!(
            command = %update.command,
            delta = update.delta,
            "[{}/{}] {}",
            update.completed,
            update.total,
            update.command
        );
    }
}

/// Per-run progress counter.
pub(crate) struct ProgressTracker {
    sink: Option<Arc<dyn ProgressSink>>,
    completed: usize,
    total: usize,
}

impl ProgressTracker {
    pub(crate) fn new(sink: Option<Arc<dyn ProgressSink>>, total: usize) -> Self {
        Self {
            sink,
            completed: 0,
            total,
        }
    }

    pub(crate) fn advance(&mut self, command: Command, delta: usize) {
        if delta == 0 {
            return;
        }
        self.completed += delta;
        if let Some(sink) = &self.sink {
            sink.advance(ProgressUpdate {
                command,
                delta,
                completed: self.completed,
                total: self.total,
            });
        }
    }

    #[cfg(test)]
    pub(crate) fn completed(&self) -> usize {
        self.completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_emits_running_totals() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tracker = ProgressTracker::new(Some(Arc::new(tx)), 5);

        tracker.advance(Command::Copy, 1);
        tracker.advance(Command::Copy, 0);
        tracker.advance(Command::Zip, 3);

        assert_eq!(tracker.completed(), 4);
        assert_eq!(
            rx.try_recv().unwrap(),
            ProgressUpdate {
                command: Command::Copy,
                delta: 1,
                completed: 1,
                total: 5
            }
        );
        let second = rx.try_recv().unwrap();
        assert_eq!((second.command, second.delta, second.completed), (Command::Zip, 3, 4));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_log_sink_accepts_updates() {
        let mut tracker = ProgressTracker::new(Some(Arc::new(LogProgress)), 3);

        tracker.advance(Command::Unzip, 2);
        tracker.advance(Command::Unzip, 1);

        assert_eq!(tracker.completed(), 3);
    }

    #[test]
    fn test_bounded_sink_drops_when_full() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut tracker = ProgressTracker::new(Some(Arc::new(tx)), 2);

        tracker.advance(Command::Del, 1);
        tracker.advance(Command::Del, 1);

        assert_eq!(rx.try_recv().unwrap().completed, 1);
        assert!(rx.try_recv().is_err());
        assert_eq!(tracker.completed(), 2);
    }
}
