//! Core of caledit: edit calendar events as plain text.
//!
//! Events are fetched from a remote calendar, rendered as blocks of
//! `key: value` lines, edited by the user, then parsed back and synced:
//! - `record` and `serialize` convert between events and text
//! - `timestamp`, `iso8601` and `reminder` handle the field formats
//! - `action` decides what each edited block means
//! - `sync` applies the blocks through a `remote::Remote`

pub mod action;
pub mod config;
pub mod date_range;
pub mod error;
pub mod event;
pub mod iso8601;
pub mod record;
pub mod reminder;
pub mod remote;
pub mod serialize;
pub mod store;
pub mod sync;
pub mod timestamp;

pub use error::{CalEditError, CalEditResult};
pub use event::{EditHandle, Event, EventUpdate};
pub use record::{Record, RecordParser, parse_records};
pub use reminder::Reminder;
pub use store::{EventFilter, EventStore};
pub use timestamp::TimestampCodec;
