//! Provider-neutral event types.
//!
//! Providers convert their API responses into these types, and caledit works
//! exclusively with them for rendering, resolution and sync. Timestamps cross
//! the provider boundary as ISO-8601 strings.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::reminder::Reminder;

/// Title given to events inserted before their fields are applied.
pub const PLACEHOLDER_TITLE: &str = "_new_event";

/// Opaque reference the remote needs to update or delete an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditHandle(String);

impl EditHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        EditHandle(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EditHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A calendar event as fetched from the remote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Identity assigned by the remote
    pub id: String,
    pub handle: EditHandle,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, with = "crate::iso8601::option")]
    pub start: Option<DateTime<FixedOffset>>,
    #[serde(default, with = "crate::iso8601::option")]
    pub end: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
}

impl Event {
    pub fn new(id: impl Into<String>, handle: EditHandle) -> Self {
        Event {
            id: id.into(),
            handle,
            title: None,
            start: None,
            end: None,
            location: None,
            description: None,
            reminders: Vec::new(),
        }
    }

    /// End time, falling back to the start time when the remote has none.
    pub fn until(&self) -> Option<DateTime<FixedOffset>> {
        self.end.or(self.start)
    }
}

/// Full replacement of an event's editable fields.
///
/// Fields left as `None` are cleared on the remote. `start` and `end` are
/// remote timestamps (RFC 3339).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventUpdate {
    pub title: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub reminders: Vec<Reminder>,
    pub location: Option<String>,
    pub description: Option<String>,
}
