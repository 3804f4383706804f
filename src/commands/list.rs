use anyhow::Result;
use owo_colors::OwoColorize;

use caledit_core::serialize::{DisplayMode, EventSerializer, SortField};
use caledit_core::{EventFilter, EventStore, TimestampCodec};

pub fn run(
    store: &EventStore,
    filter: &EventFilter,
    mode: DisplayMode,
    sort: SortField,
    codec: &TimestampCodec,
) -> Result<()> {
    let text = EventSerializer::new(codec)
        .mode(mode)
        .sort_by(sort)
        .render(store.filter(filter));

    if text.is_empty() {
        println!("{}", "No events found".dimmed());
    } else {
        print!("{text}");
    }

    Ok(())
}
