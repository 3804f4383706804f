//! Colored terminal rendering for sync results.

use caledit_core::sync::{Applied, RecordReport, SyncReport};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for RecordReport {
    fn render(&self) -> String {
        let label = if self.label.is_empty() {
            "(No title)"
        } else {
            self.label.as_str()
        };

        let mut line = match &self.result {
            Ok(Applied::Added(_)) => format!("{} {}", "+".green(), label.green()),
            Ok(Applied::Updated(_)) => format!("{} {}", "~".yellow(), label.yellow()),
            Ok(Applied::Deleted(_)) => format!("{} {}", "-".red(), label.red()),
            Ok(Applied::Skipped) => format!("  {}", label.dimmed()),
            Err(e) => format!("{} {} {}", "!".red().bold(), label, e.to_string().red()),
        };

        for warning in &self.warnings {
            line.push_str(&format!("\n    {} {}", "warning:".yellow(), warning.dimmed()));
        }

        line
    }
}

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

pub fn render_summary(report: &SyncReport) -> String {
    let (added, updated, deleted) = report.counts();
    let mut summary = format!(
        "Synced: {} added, {} updated, {} deleted",
        added, updated, deleted
    );

    let failed = report.failures().count();
    if failed > 0 {
        let failures = format!(", {} {} failed", failed, pluralize("record", failed));
        summary.push_str(&failures.red().to_string());
    }

    summary
}
