//! Rendering events as editable text.

use std::cmp::Ordering;
use std::fmt::Write;

use chrono::{DateTime, FixedOffset};

use crate::event::Event;
use crate::record::escape_value;
use crate::timestamp::TimestampCodec;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayMode {
    /// One `when<TAB>what` line per event
    Short,
    /// Every attribute, in the format the record parser reads back
    #[default]
    Long,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    Id,
    What,
    #[default]
    When,
    Until,
    Where,
    Description,
}

/// Per-event sort key. `None` sorts after every populated value.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SortValue {
    Text(String),
    Time(DateTime<FixedOffset>),
}

impl SortField {
    fn value(self, event: &Event) -> Option<SortValue> {
        let text = |s: Option<&str>| {
            s.filter(|s| !s.is_empty())
                .map(|s| SortValue::Text(s.to_lowercase()))
        };
        match self {
            SortField::Id => text(Some(event.id.as_str())),
            SortField::What => text(event.title.as_deref()),
            SortField::When => event.start.map(SortValue::Time),
            SortField::Until => event.until().map(SortValue::Time),
            SortField::Where => text(event.location.as_deref()),
            SortField::Description => text(event.description.as_deref()),
        }
    }

    fn compare(self, a: &Event, b: &Event) -> Ordering {
        let by_field = match (self.value(a), self.value(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_field.then_with(|| a.id.cmp(&b.id))
    }
}

/// Renders a set of events in a display mode and sort order.
pub struct EventSerializer<'a> {
    codec: &'a TimestampCodec,
    mode: DisplayMode,
    sort: SortField,
}

impl<'a> EventSerializer<'a> {
    pub fn new(codec: &'a TimestampCodec) -> Self {
        EventSerializer {
            codec,
            mode: DisplayMode::default(),
            sort: SortField::default(),
        }
    }

    pub fn mode(mut self, mode: DisplayMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn sort_by(mut self, sort: SortField) -> Self {
        self.sort = sort;
        self
    }

    pub fn render<'e>(&self, events: impl IntoIterator<Item = &'e Event>) -> String {
        let mut events: Vec<&Event> = events.into_iter().collect();
        events.sort_by(|a, b| self.sort.compare(a, b));

        let mut out = String::new();
        for event in events {
            match self.mode {
                DisplayMode::Short => self.write_short(&mut out, event),
                DisplayMode::Long => self.write_long(&mut out, event),
            }
        }
        out
    }

    fn write_short(&self, out: &mut String, event: &Event) {
        let when = event
            .start
            .as_ref()
            .map(|t| self.codec.display(t))
            .unwrap_or_default();
        let what = event.title.as_deref().unwrap_or_default();
        let _ = writeln!(out, "{when}\t{}", escape_value(what));
    }

    fn write_long(&self, out: &mut String, event: &Event) {
        out.push('\n');

        let mut field = |key: &str, value: Option<&str>| {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                let _ = writeln!(out, "{key}: {}", escape_value(value));
            }
        };

        let when = event.start.as_ref().map(|t| self.codec.display(t));
        let until = event.until().map(|t| self.codec.display(&t));

        field("id", Some(&event.id));
        field("what", event.title.as_deref());
        field("when", when.as_deref());
        field("until", until.as_deref());
        field("where", event.location.as_deref());
        field("description", event.description.as_deref());

        for reminder in &event.reminders {
            let _ = writeln!(out, "remind: {reminder}");
        }
    }
}
