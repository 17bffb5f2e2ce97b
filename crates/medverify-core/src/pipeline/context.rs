//! Run-scoped pipeline state.

use std::sync::Arc;

use tracing::debug;

use super::events::{EventSink, NoopSink, PipelineEvent, Stage};
use crate::models::{ActivityLog, StageHandle, StageOutcome, VerificationResult};

/// Everything one verification run owns: stage, progress, activity log and
/// results. Independent runs use independent contexts.
pub struct RunContext {
    run_id: String,
    stage: Stage,
    progress: u8,
    message: String,
    activity: ActivityLog,
    results: Vec<VerificationResult>,
    sink: Arc<dyn EventSink>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("run_id", &self.run_id)
            .field("stage", &self.stage)
            .field("progress", &self.progress)
            .field("message", &self.message)
            .field("activity", &self.activity.len())
            .field("results", &self.results.len())
            .finish()
    }
}

impl RunContext {
    /// Context whose events are discarded.
    pub fn new() -> Self {
        Self::with_sink(Arc::new(NoopSink))
    }

    /// Context reporting events to `sink`.
    pub fn with_sink(sink: Arc<dyn EventSink>) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            stage: Stage::Idle,
            progress: 0,
            message: String::new(),
            activity: ActivityLog::new(),
            results: Vec::new(),
            sink,
        }
    }

    /// ID of the current (or most recent) run.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Percent complete (0 - 100)
    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    pub fn results(&self) -> &[VerificationResult] {
        &self.results
    }

    pub(crate) fn sink(&self) -> Arc<dyn EventSink> {
        Arc::clone(&self.sink)
    }

    /// Clear all state of the previous run and start a new one.
    pub fn reset(&mut self) {
        self.run_id = uuid::Uuid::new_v4().to_string();
        self.stage = Stage::Idle;
        self.progress = 0;
        self.message.clear();
        self.activity.clear();
        self.results.clear();
    }

    /// Enter `stage` at `percent`.
    pub(crate) fn enter(&mut self, stage: Stage, percent: u8, message: &str) {
        debug!("Run {}: {} at {}%", self.run_id, stage, percent);
        self.stage = stage;
        self.message = message.to_string();
        self.set_progress(percent);
    }

    /// Update the percentage within the current stage.
    pub(crate) fn set_progress(&mut self, percent: u8) {
        self.progress = percent.min(100);
        self.sink.emit(PipelineEvent::Progress {
            stage: self.stage,
            percent: self.progress,
            message: self.message.clone(),
        });
    }

    /// Record progress that was already reported to the sink.
    pub(crate) fn sync_progress(&mut self, percent: u8) {
        self.progress = percent.min(100);
    }

    pub(crate) fn begin_stage(&mut self, action: &str) -> StageHandle {
        let handle = self.activity.begin(action);
        if let Some(entry) = self.activity.last() {
            self.sink.emit(PipelineEvent::ActivityAppended(entry.clone()));
        }
        handle
    }

    pub(crate) fn complete_stage(&mut self, handle: StageHandle, outcome: StageOutcome, detail: String) {
        if let Some(entry) = self.activity.complete(handle, outcome, Some(detail)) {
            self.sink.emit(PipelineEvent::ActivityUpdated(entry.clone()));
        }
    }

    /// Append an activity entry that needs no completion step.
    pub(crate) fn record_activity(&mut self, action: &str, outcome: StageOutcome, detail: String) {
        let entry = self.activity.record(action, outcome, Some(detail)).clone();
        self.sink.emit(PipelineEvent::ActivityAppended(entry));
    }

    /// Store the results and mark the run complete.
    pub(crate) fn finish(&mut self, results: Vec<VerificationResult>) {
        self.results = results;
        self.enter(Stage::Complete, 100, "Verification complete!");
        self.sink.emit(PipelineEvent::Completed {
            results: self.results.clone(),
        });
    }

    /// Abort the run: fail the open activity entry, drop partial results
    /// and return to idle.
    pub(crate) fn fail(&mut self, detail: String, user_message: String) {
        if let Some(entry) = self.activity.fail_open(detail) {
            self.sink.emit(PipelineEvent::ActivityUpdated(entry.clone()));
        }
        self.results.clear();
        self.stage = Stage::Idle;
        self.progress = 0;
        self.message = user_message.clone();
        self.sink.emit(PipelineEvent::Failed {
            message: user_message,
        });
    }
}
