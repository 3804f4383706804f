use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use tracing::debug;

use caledit_core::config::CalEditConfig;
use caledit_core::remote::Remote;
use caledit_core::serialize::{DisplayMode, EventSerializer, SortField};
use caledit_core::sync::{Applied, SyncEngine};
use caledit_core::{EventFilter, EventStore, parse_records};

use crate::render::{self, Render};

pub async fn run<R: Remote>(
    engine: &SyncEngine<R>,
    store: &mut EventStore,
    filter: &EventFilter,
    sort: SortField,
    config: &CalEditConfig,
) -> Result<()> {
    let original = EventSerializer::new(engine.codec())
        .mode(DisplayMode::Long)
        .sort_by(sort)
        .render(store.filter(filter));

    let temp_dir = config.temp_dir();
    let mut file = tempfile::Builder::new()
        .prefix("caledit-")
        .suffix(".txt")
        .tempfile_in(&temp_dir)
        .with_context(|| format!("Could not create a scratch file in {}", temp_dir.display()))?;
    file.write_all(original.as_bytes())?;
    file.flush()?;

    launch_editor(&config.editor(), file.path()).await?;

    let edited = std::fs::read_to_string(file.path())
        .with_context(|| format!("Could not read back {}", file.path().display()))?;

    if edited == original {
        println!("{}", "No changes".dimmed());
        return Ok(());
    }

    let report = engine.apply_all(parse_records(&edited), store).await;

    for record in report.records() {
        if !matches!(record.result, Ok(Applied::Skipped)) {
            println!("{}", record.render());
        }
    }
    println!("\n{}", render::render_summary(&report));

    let failed = report.failures().count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} records could not be synced", report.records().len());
    }

    Ok(())
}

/// Run the editor command (which may carry arguments) on `path` and wait.
async fn launch_editor(editor: &str, path: &Path) -> Result<()> {
    let mut parts = editor.split_whitespace();
    let program = parts.next().context("Editor command is empty")?;
    debug!("Launching {editor} on {}", path.display());

    let status = tokio::process::Command::new(program)
        .args(parts)
        .arg(path)
        .status()
        .await
        .with_context(|| format!("Could not launch editor '{editor}'"))?;

    if !status.success() {
        anyhow::bail!("Editor '{editor}' exited with {status}");
    }

    Ok(())
}
