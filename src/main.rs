mod commands;
mod render;

use anyhow::{Context, Result};
use caledit_core::config::CalEditConfig;
use caledit_core::date_range::DateRange;
use caledit_core::remote::{ProviderRemote, Remote};
use caledit_core::serialize::{DisplayMode, SortField};
use caledit_core::sync::SyncEngine;
use caledit_core::{EventFilter, EventStore, TimestampCodec};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const RECORD_FORMAT_HELP: &str = "\
EVENT RECORDS:
    With --edit, the selected events are written to a scratch file, one
    attribute per line, with a blank line between events:

        id: s27q7kplr9jpljftprurg3ro2g
        what: Dentist appointment
        when: 2011-01-31 09:00:00
        until: 2011-01-31 10:00:00
        where: 123 Main St
        description: General cleaning
        remind: 60 minutes by email
        remind: 5 minutes by popup

    when, until       yyyy-mm-dd hh:mm:ss in local time. until defaults to
                      when. Without when, until and remind are ignored.
    remind            <minutes> minutes by <method>, may repeat
    description       \\n for a line break, \\\\ for a backslash

    Every record in the saved file is synced:
        no id                   the event is added
        id                      the event is replaced by the record
        id and what: DELETE     the event is deleted (uppercase required)

    Quitting the editor without saving changes nothing. Removing records
    you did not change from the file makes the sync faster.

EXAMPLES:
    # Events matching 'dentist', one line each, sorted by title
    caledit dentist --mode short --sort what

    # Edit this week's events
    caledit --edit --from-date 2011-01-31 --to-date 2011-02-06";

#[derive(Parser)]
#[command(name = "caledit", version)]
#[command(about = "List, create, update and delete calendar events by editing them as text")]
#[command(after_long_help = RECORD_FORMAT_HELP)]
struct Cli {
    /// Only events whose title or description matches (case-insensitive regex)
    keyword: Option<String>,

    /// Account to log in with (defaults to `account` in the config file)
    #[arg(short, long)]
    account: Option<String>,

    /// Open the selected events in an editor and sync the changes
    #[arg(short, long)]
    edit: bool,

    /// Events from this date (YYYY-MM-DD, default today)
    #[arg(short, long = "from-date", value_name = "DATE")]
    from: Option<String>,

    /// Events until the end of this date (YYYY-MM-DD)
    #[arg(short, long = "to-date", value_name = "DATE")]
    to: Option<String>,

    /// Only the event with this id (the keyword is ignored)
    #[arg(short, long)]
    id: Option<String>,

    /// Display mode (editing always uses long)
    #[arg(short, long, value_enum, default_value_t = Mode::Long)]
    mode: Mode,

    /// Field to sort events by
    #[arg(short, long, value_enum, default_value_t = Sort::When)]
    sort: Sort,

    /// Show progress
    #[arg(short, long)]
    verbose: bool,

    /// Show debug output
    #[arg(long)]
    vv: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Long,
    Short,
}

impl From<Mode> for DisplayMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Long => DisplayMode::Long,
            Mode::Short => DisplayMode::Short,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Sort {
    Id,
    What,
    When,
    Until,
    Where,
    Description,
}

impl From<Sort> for SortField {
    fn from(sort: Sort) -> Self {
        match sort {
            Sort::Id => SortField::Id,
            Sort::What => SortField::What,
            Sort::When => SortField::When,
            Sort::Until => SortField::Until,
            Sort::Where => SortField::Where,
            Sort::Description => SortField::Description,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = CalEditConfig::load()?;
    let account = resolve_account(&cli, &config)?;

    let codec = TimestampCodec::local();
    let range = DateRange::from_args(cli.from.as_deref(), cli.to.as_deref(), &codec)?;

    let remote = ProviderRemote::from_config(&config, &account)?;
    let events = remote
        .query_events(&range)
        .await
        .with_context(|| format!("Could not fetch events for {account}"))?;

    let mut store = EventStore::new(events);
    let filter = EventFilter::new(cli.keyword.as_deref(), cli.id.as_deref());

    if cli.edit {
        let engine = SyncEngine::new(remote, codec, config.retry_policy()?);
        commands::edit::run(&engine, &mut store, &filter, cli.sort.into(), &config).await
    } else {
        commands::list::run(&store, &filter, cli.mode.into(), cli.sort.into(), &codec)
    }
}

fn resolve_account(cli: &Cli, config: &CalEditConfig) -> Result<String> {
    if let Some(account) = cli.account.clone().or_else(|| config.account.clone()) {
        return Ok(account);
    }

    let config_path = CalEditConfig::config_path()?;
    anyhow::bail!(
        "Unable to determine the calendar account to log in with.\n\n\
        Pass it with:\n  \
        caledit --account you@example.com\n\n\
        or set it in {}:\n  \
        account = \"you@example.com\"",
        config_path.display()
    )
}

fn init_tracing(cli: &Cli) {
    let level = if cli.vv {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env("CALEDIT_LOG").unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .compact()
                .without_time()
                .with_target(false)
                .with_writer(std::io::stdout),
        )
        .init();
}
