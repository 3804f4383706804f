use crate::error::{CalEditError, CalEditResult};
use crate::record::Record;
use crate::store::EventStore;

/// Title that turns an existing event's record into a deletion.
pub const DELETE_MARKER: &str = "DELETE";

/// What to do with one edited record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Skip,
    Add,
    Update { id: String },
    Delete { id: String },
}

impl Action {
    /// Progress verb shown while the action runs.
    pub fn verb(&self) -> &'static str {
        match self {
            Action::Skip => "Skipping",
            Action::Add => "Adding",
            Action::Update { .. } => "Updating",
            Action::Delete { .. } => "Deleting",
        }
    }
}

/// Classify a record without looking at the store.
pub fn classify(record: &Record) -> Action {
    if record.is_empty() {
        return Action::Skip;
    }
    match &record.id {
        Some(id) if record.what.as_deref() == Some(DELETE_MARKER) => {
            Action::Delete { id: id.clone() }
        }
        Some(id) => Action::Update { id: id.clone() },
        None => Action::Add,
    }
}

/// Classify a record and check that any id it names was fetched.
pub fn resolve(record: &Record, store: &EventStore) -> CalEditResult<Action> {
    let action = classify(record);
    if let Action::Update { id } | Action::Delete { id } = &action {
        if store.get(id).is_none() {
            return Err(CalEditError::UnknownEvent(id.clone()));
        }
    }
    Ok(action)
}
