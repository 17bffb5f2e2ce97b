//! Stage and activity events reported to the caller.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use crate::models::{ActivityEntry, VerificationResult};

/// Pipeline stage of a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[default]
    Idle,
    Preprocessing,
    Barcode,
    Ocr,
    Analysis,
    Validation,
    Complete,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Preprocessing => "preprocessing",
            Stage::Barcode => "barcode",
            Stage::Ocr => "ocr",
            Stage::Analysis => "analysis",
            Stage::Validation => "validation",
            Stage::Complete => "complete",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event emitted while a run progresses.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// Stage or percentage changed
    Progress {
        stage: Stage,
        /// Percent complete (0 - 100)
        percent: u8,
        message: String,
    },
    /// A new activity entry was appended
    ActivityAppended(ActivityEntry),
    /// The tail activity entry reached a terminal status
    ActivityUpdated(ActivityEntry),
    /// The run finished with these results
    Completed { results: Vec<VerificationResult> },
    /// The run aborted; emitted once per failed run
    Failed { message: String },
}

/// Receiver of pipeline events. Implementations must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: PipelineEvent) {}
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events.
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Percentages of all progress events, in order.
    pub fn progress_percents(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                PipelineEvent::Progress { percent, .. } => Some(percent),
                _ => None,
            })
            .collect()
    }

    /// Messages of all failure events.
    pub fn failures(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                PipelineEvent::Failed { message } => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Forwards every event to a closure.
pub struct CallbackSink<F> {
    callback: F,
}

impl<F> CallbackSink<F>
where
    F: Fn(&PipelineEvent) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> EventSink for CallbackSink<F>
where
    F: Fn(&PipelineEvent) + Send + Sync,
{
    fn emit(&self, event: PipelineEvent) {
        (self.callback)(&event);
    }
}

/// Streams events over a channel; events sent after the receiver is gone are dropped.
impl EventSink for UnboundedSender<PipelineEvent> {
    fn emit(&self, event: PipelineEvent) {
        let _ = self.send(event);
    }
}
