//! The set of events fetched for the current session.

use std::collections::HashSet;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::event::Event;

/// Events fetched from the remote, updated in place as records are synced.
///
/// Lookups are by exact id. Deleted events stay in the list but are no
/// longer returned.
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
    removed: HashSet<String>,
}

impl EventStore {
    pub fn new(events: Vec<Event>) -> Self {
        EventStore {
            events,
            removed: HashSet::new(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Event> {
        if self.removed.contains(id) {
            return None;
        }
        self.events.iter().find(|e| e.id == id)
    }

    pub fn push(&mut self, event: Event) {
        self.removed.remove(&event.id);
        self.events.push(event);
    }

    /// Swap in the remote's copy of an event after an update.
    pub fn replace(&mut self, event: Event) {
        match self.events.iter_mut().find(|e| e.id == event.id) {
            Some(slot) => *slot = event,
            None => self.events.push(event),
        }
    }

    pub fn mark_removed(&mut self, id: &str) {
        self.removed.insert(id.to_string());
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter().filter(|e| !self.removed.contains(&e.id))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events selected by `filter`, in fetch order.
    pub fn filter<'a>(&'a self, filter: &'a EventFilter) -> Vec<&'a Event> {
        self.iter().filter(|e| filter.matches(e)).collect()
    }
}

#[derive(Debug)]
enum Keyword {
    Pattern(Regex),
    Plain(String),
}

/// Selection of events for display or editing.
///
/// An id selects exactly that event and the keyword is ignored. A keyword
/// is matched case-insensitively against title and description, as a
/// regular expression when it compiles and as plain text otherwise.
#[derive(Debug, Default)]
pub struct EventFilter {
    id: Option<String>,
    keyword: Option<Keyword>,
}

impl EventFilter {
    pub fn new(keyword: Option<&str>, id: Option<&str>) -> Self {
        if let Some(id) = id {
            return EventFilter {
                id: Some(id.to_string()),
                keyword: None,
            };
        }

        let keyword = keyword.filter(|k| !k.is_empty()).map(|k| {
            match RegexBuilder::new(k).case_insensitive(true).build() {
                Ok(re) => Keyword::Pattern(re),
                Err(e) => {
                    debug!("Keyword '{k}' is not a valid pattern ({e}), matching as text");
                    Keyword::Plain(k.to_lowercase())
                }
            }
        });

        EventFilter { id: None, keyword }
    }

    pub fn matches(&self, event: &Event) -> bool {
        if let Some(id) = &self.id {
            return &event.id == id;
        }

        let Some(keyword) = &self.keyword else {
            return true;
        };

        [event.title.as_deref(), event.description.as_deref()]
            .into_iter()
            .flatten()
            .any(|text| match keyword {
                Keyword::Pattern(re) => re.is_match(text),
                Keyword::Plain(needle) => text.to_lowercase().contains(needle),
            })
    }
}
