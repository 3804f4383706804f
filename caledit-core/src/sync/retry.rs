//! Bounded retry of transient remote failures.

use std::future::Future;
use std::time::Duration;

use tracing::error;

use crate::error::{CalEditError, CalEditResult};

/// Waits between attempts.
pub trait Pause {
    fn pause(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    pub pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 15,
            pause: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds, fails with a non-transient error, or
    /// the attempts run out. `op` receives the 1-based attempt number.
    pub async fn run<T, F, Fut, P>(&self, pause: &P, mut op: F) -> CalEditResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = CalEditResult<T>>,
        P: Pause,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    error!("Attempt {attempt}/{max_attempts} failed: {e}");
                    if attempt >= max_attempts {
                        return Err(CalEditError::RetriesExhausted {
                            attempts: attempt,
                            last: e.to_string(),
                        });
                    }
                    pause.pause(self.pause).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
