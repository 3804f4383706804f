//! An in-process remote holding events in memory.
//!
//! Failures can be scripted so sync behaviour can be exercised without a
//! provider binary.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::date_range::DateRange;
use crate::error::{CalEditError, CalEditResult};
use crate::event::{EditHandle, Event, EventUpdate, PLACEHOLDER_TITLE};
use crate::iso8601;
use crate::remote::Remote;

/// Number of calls made to each remote operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub query: usize,
    pub insert: usize,
    pub update: usize,
    pub delete: usize,
}

#[derive(Debug, Default)]
struct State {
    events: Vec<Event>,
    next_id: usize,
    update_failures: VecDeque<CalEditError>,
    reject_deletes: bool,
    calls: CallCounts,
}

#[derive(Debug, Default)]
pub struct MemoryRemote {
    state: Mutex<State>,
}

impl MemoryRemote {
    pub fn new(events: Vec<Event>) -> Self {
        MemoryRemote {
            state: Mutex::new(State {
                events,
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next updates fail with these errors, in order.
    pub fn fail_updates(&self, errors: impl IntoIterator<Item = CalEditError>) {
        self.state().update_failures.extend(errors);
    }

    pub fn reject_deletes(&self) {
        self.state().reject_deletes = true;
    }

    pub fn calls(&self) -> CallCounts {
        self.state().calls
    }

    pub fn events(&self) -> Vec<Event> {
        self.state().events.clone()
    }

    pub fn get(&self, id: &str) -> Option<Event> {
        self.state().events.iter().find(|e| e.id == id).cloned()
    }
}

fn parse_optional(value: &Option<String>) -> CalEditResult<Option<chrono::DateTime<chrono::FixedOffset>>> {
    value.as_deref().map(iso8601::parse).transpose()
}

impl Remote for MemoryRemote {
    async fn query_events(&self, range: &DateRange) -> CalEditResult<Vec<Event>> {
        let mut state = self.state();
        state.calls.query += 1;
        Ok(state
            .events
            .iter()
            .filter(|e| match e.start {
                Some(start) => start >= range.from && range.to.is_none_or(|to| start <= to),
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn insert_placeholder(&self) -> CalEditResult<Event> {
        let mut state = self.state();
        state.calls.insert += 1;
        state.next_id += 1;

        let id = format!("memory-{}", state.next_id);
        let mut event = Event::new(id.clone(), EditHandle::new(format!("edit/{id}")));
        event.title = Some(PLACEHOLDER_TITLE.to_string());
        state.events.push(event.clone());
        Ok(event)
    }

    async fn update_event(&self, handle: &EditHandle, update: &EventUpdate) -> CalEditResult<Event> {
        let mut state = self.state();
        state.calls.update += 1;
        if let Some(err) = state.update_failures.pop_front() {
            return Err(err);
        }

        let start = parse_optional(&update.start)?;
        let end = parse_optional(&update.end)?;

        let event = state
            .events
            .iter_mut()
            .find(|e| &e.handle == handle)
            .ok_or_else(|| CalEditError::Remote(format!("No event with handle {handle}")))?;

        event.title = update.title.clone();
        event.start = start;
        event.end = end;
        event.location = update.location.clone();
        event.description = update.description.clone();
        event.reminders = update.reminders.clone();
        Ok(event.clone())
    }

    async fn delete_event(&self, handle: &EditHandle) -> CalEditResult<()> {
        let mut state = self.state();
        state.calls.delete += 1;
        if state.reject_deletes {
            return Err(CalEditError::Remote("Delete rejected".into()));
        }

        let before = state.events.len();
        state.events.retain(|e| &e.handle != handle);
        if state.events.len() == before {
            return Err(CalEditError::Remote(format!("No event with handle {handle}")));
        }
        Ok(())
    }
}
