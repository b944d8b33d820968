//! Progress events
//!
//! Runs report progress over a `tokio::sync::mpsc` channel. Sending never
//! blocks and a dropped receiver is ignored, so observers cannot stall or
//! fail a run.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Progress notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// A stage request was dispatched
    Progress {
        /// Stage label
        label: String,
        /// Share of stages completed at dispatch time, 0..=100
        percent: u8,
    },
    /// A stage result was stored
    StepComplete {
        /// Stage label
        label: String,
    },
    /// One item of a per-item pass finished
    ItemProgress {
        /// 1-based position
        index: usize,
        /// Number of items
        total: usize,
        /// Item name
        name: String,
    },
}

/// `completed / total * 100`, with an empty total counting as done
#[must_use]
pub fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = completed.min(total) * 100 / total;
    u8::try_from(pct).unwrap_or(100)
}

/// Sending half handed to runs
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::UnboundedSender<ProgressEvent>>,
}

impl EventSink {
    /// Create a sink and its receiver
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// Sink that drops every event
    #[inline]
    #[must_use]
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Send an event
    pub fn emit(&self, event: ProgressEvent) {
        if let Some(tx) = &self.tx {
            if tx.send(event).is_err() {
                tracing::trace!("progress receiver dropped");
            }
        }
    }

    /// Send [`ProgressEvent::Progress`]
    pub fn progress(&self, label: &str, percent: u8) {
        self.emit(ProgressEvent::Progress {
            label: label.to_string(),
            percent,
        });
    }

    /// Send [`ProgressEvent::StepComplete`]
    pub fn step_complete(&self, label: &str) {
        self.emit(ProgressEvent::StepComplete {
            label: label.to_string(),
        });
    }

    /// Send [`ProgressEvent::ItemProgress`]
    pub fn item(&self, index: usize, total: usize, name: &str) {
        self.emit(ProgressEvent::ItemProgress {
            index,
            total,
            name: name.to_string(),
        });
    }
}

impl From<mpsc::UnboundedSender<ProgressEvent>> for EventSink {
    fn from(tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { tx: Some(tx) }
    }
}

/// Drain everything currently queued
pub fn drain(rx: &mut mpsc::UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}
