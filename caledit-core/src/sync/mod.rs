//! Syncing edited records back to the remote calendar.

mod engine;
mod report;
mod retry;

pub use engine::SyncEngine;
pub use report::{Applied, RecordReport, SyncReport};
pub use retry::{Pause, RetryPolicy, TokioPause};
