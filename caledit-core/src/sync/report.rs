//! Per-record outcomes of a sync run.

use crate::error::{CalEditError, CalEditResult};

/// What a successfully applied record did on the remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Skipped,
    /// Event id of the new event
    Added(String),
    Updated(String),
    Deleted(String),
}

#[derive(Debug)]
pub struct RecordReport {
    /// The record's title, description or id
    pub label: String,
    pub result: CalEditResult<Applied>,
    /// Problems that did not fail the record, such as dropped reminders
    pub warnings: Vec<String>,
}

impl RecordReport {
    pub fn is_failure(&self) -> bool {
        self.result.is_err()
    }
}

#[derive(Debug, Default)]
pub struct SyncReport(Vec<RecordReport>);

impl SyncReport {
    pub fn push(&mut self, label: impl Into<String>, result: CalEditResult<Applied>) {
        self.push_with_warnings(label, result, Vec::new());
    }

    pub fn push_with_warnings(
        &mut self,
        label: impl Into<String>,
        result: CalEditResult<Applied>,
        warnings: Vec<String>,
    ) {
        self.0.push(RecordReport {
            label: label.into(),
            result,
            warnings,
        });
    }

    pub fn warnings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().flat_map(|r| {
            r.warnings
                .iter()
                .map(move |w| (r.label.as_str(), w.as_str()))
        })
    }

    pub fn records(&self) -> &[RecordReport] {
        &self.0
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &CalEditError)> {
        self.0
            .iter()
            .filter_map(|r| r.result.as_ref().err().map(|e| (r.label.as_str(), e)))
    }

    pub fn is_success(&self) -> bool {
        self.0.iter().all(|r| !r.is_failure())
    }

    /// (added, updated, deleted)
    pub fn counts(&self) -> (usize, usize, usize) {
        let mut added = 0;
        let mut updated = 0;
        let mut deleted = 0;

        for report in &self.0 {
            match report.result {
                Ok(Applied::Added(_)) => added += 1,
                Ok(Applied::Updated(_)) => updated += 1,
                Ok(Applied::Deleted(_)) => deleted += 1,
                Ok(Applied::Skipped) | Err(_) => {}
            }
        }

        (added, updated, deleted)
    }
}
