//! Activity log of pipeline stage transitions.
//!
//! The log is append-only. The single exception is the tail entry, which
//! moves from `Processing` to a terminal status exactly once, through the
//! [`StageHandle`] returned by [`ActivityLog::begin`].

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Status of an activity entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Processing,
    Success,
    Error,
}

/// Terminal status a stage can complete with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Success,
    Error,
}

impl From<StageOutcome> for ActivityStatus {
    fn from(outcome: StageOutcome) -> Self {
        match outcome {
            StageOutcome::Success => ActivityStatus::Success,
            StageOutcome::Error => ActivityStatus::Error,
        }
    }
}

/// One recorded stage transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityEntry {
    /// Unique entry ID
    pub id: String,
    /// Action label (e.g., "Barcode detection")
    pub action: String,
    pub status: ActivityStatus,
    /// Timestamp (RFC 3339)
    pub timestamp: String,
    pub detail: Option<String>,
}

impl ActivityEntry {
    fn new(action: String, status: ActivityStatus, detail: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            action,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
            detail,
        }
    }
}

/// Proof that a stage was opened; consumed when the stage completes.
#[derive(Debug)]
#[must_use = "an open stage must be completed"]
pub struct StageHandle {
    index: usize,
    id: String,
}

impl StageHandle {
    pub fn entry_id(&self) -> &str {
        &self.id
    }
}

/// Ordered record of what a run did.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ActivityLog {
    entries: Vec<ActivityEntry>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ActivityEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ActivityEntry> {
        self.entries.last()
    }

    /// Find the first entry with the given action label.
    pub fn find(&self, action: &str) -> Option<&ActivityEntry> {
        self.entries.iter().find(|e| e.action == action)
    }

    /// Count entries with the given status.
    pub fn count(&self, status: ActivityStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    /// Whether the tail entry is still processing.
    pub fn has_open_stage(&self) -> bool {
        self.last()
            .is_some_and(|e| e.status == ActivityStatus::Processing)
    }

    /// Append a `Processing` entry and return the handle that completes it.
    pub fn begin(&mut self, action: impl Into<String>) -> StageHandle {
        let entry = ActivityEntry::new(action.into(), ActivityStatus::Processing, None);
        let handle = StageHandle {
            index: self.entries.len(),
            id: entry.id.clone(),
        };
        self.entries.push(entry);
        handle
    }

    /// Complete the stage opened by `handle`.
    ///
    /// Only the tail entry can be completed; a handle whose entry is no
    /// longer the tail (or belongs to another log) leaves the log untouched
    /// and returns `None`.
    pub fn complete(
        &mut self,
        handle: StageHandle,
        outcome: StageOutcome,
        detail: Option<String>,
    ) -> Option<&ActivityEntry> {
        let tail = self.entries.len().checked_sub(1)?;
        let entry = &mut self.entries[tail];
        if handle.index != tail
            || entry.id != handle.id
            || entry.status != ActivityStatus::Processing
        {
            warn!("Ignoring completion of stale stage handle {}", handle.id);
            return None;
        }

        entry.status = outcome.into();
        entry.detail = detail;
        Some(&*entry)
    }

    /// Append an entry that is already in a terminal status.
    pub fn record(
        &mut self,
        action: impl Into<String>,
        outcome: StageOutcome,
        detail: Option<String>,
    ) -> &ActivityEntry {
        self.entries
            .push(ActivityEntry::new(action.into(), outcome.into(), detail));
        &self.entries[self.entries.len() - 1]
    }

    /// Mark a still-processing tail entry as failed.
    ///
    /// Used when a stage is abandoned without its handle (e.g. the run was
    /// cancelled by a caller timeout).
    pub(crate) fn fail_open(&mut self, detail: String) -> Option<&ActivityEntry> {
        let entry = self.entries.last_mut()?;
        if entry.status != ActivityStatus::Processing {
            return None;
        }
        entry.status = ActivityStatus::Error;
        entry.detail = Some(detail);
        Some(&*entry)
    }

    /// Drop every entry. Only a new run may do this.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_then_complete() {
        let mut log = ActivityLog::new();
        let handle = log.begin("Image preprocessing");
        assert!(log.has_open_stage());
        assert_eq!(log.last().unwrap().status, ActivityStatus::Processing);
        assert_eq!(handle.entry_id(), log.last().unwrap().id);

        let entry = log
            .complete(handle, StageOutcome::Success, Some("done".into()))
            .unwrap();
        assert_eq!(entry.status, ActivityStatus::Success);
        assert_eq!(entry.detail.as_deref(), Some("done"));
        assert!(!log.has_open_stage());
    }

    #[test]
    fn test_complete_rejects_non_tail_handle() {
        let mut log = ActivityLog::new();
        let first = log.begin("Barcode detection");
        log.record("Text parsing", StageOutcome::Success, None);

        assert!(log.complete(first, StageOutcome::Error, None).is_none());
        // Prior entry untouched
        assert_eq!(log.entries()[0].status, ActivityStatus::Processing);
        assert_eq!(log.entries()[1].status, ActivityStatus::Success);
    }

    #[test]
    fn test_complete_rejects_foreign_handle() {
        let mut ours = ActivityLog::new();
        let mut theirs = ActivityLog::new();
        let _ours_handle = ours.begin("OCR text extraction");
        let foreign = theirs.begin("OCR text extraction");

        assert!(ours.complete(foreign, StageOutcome::Success, None).is_none());
        assert_eq!(ours.last().unwrap().status, ActivityStatus::Processing);
    }

    #[test]
    fn test_record_appends_in_order() {
        let mut log = ActivityLog::new();
        log.record("A", StageOutcome::Success, None);
        log.record("B", StageOutcome::Error, Some("boom".into()));

        let actions: Vec<_> = log.entries().iter().map(|e| e.action.as_str()).collect();
        assert_eq!(actions, vec!["A", "B"]);
        assert_eq!(log.count(ActivityStatus::Error), 1);
        assert_ne!(log.entries()[0].id, log.entries()[1].id);
    }

    #[test]
    fn test_fail_open_only_touches_processing_tail() {
        let mut log = ActivityLog::new();
        log.record("A", StageOutcome::Success, None);
        assert!(log.fail_open("timeout".into()).is_none());

        let _handle = log.begin("B");
        let entry = log.fail_open("timeout".into()).unwrap();
        assert_eq!(entry.status, ActivityStatus::Error);
        assert_eq!(log.count(ActivityStatus::Error), 1);
    }
}
