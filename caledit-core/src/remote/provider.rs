//! Provider subprocess calls.
//!
//! A provider is any executable named `caledit-provider-{name}` on `PATH`
//! that reads one JSON request from stdin and writes one JSON response to
//! stdout. Providers manage their own credentials and tokens; caledit only
//! passes the account parameters from its config.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{CalEditError, CalEditResult};
use crate::remote::protocol::{Command, ProviderCommand, Request, Response};

pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct Provider {
    name: String,
    timeout: Duration,
}

impl Provider {
    pub fn from_name(name: &str) -> Self {
        Provider {
            name: name.to_string(),
            timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn binary_name(&self) -> String {
        format!("caledit-provider-{}", self.name)
    }

    fn binary_path(&self) -> CalEditResult<PathBuf> {
        let binary_name = self.binary_name();
        which::which(&binary_name).map_err(|_| {
            CalEditError::ProviderNotInstalled(format!(
                "Provider '{}' not found. Install it with:\n  cargo install {}",
                self.name, binary_name
            ))
        })
    }

    /// Call a typed provider command, bounded by the provider timeout.
    pub async fn call<C: ProviderCommand>(&self, cmd: C) -> CalEditResult<C::Response> {
        timeout(self.timeout, self.call_raw(C::command(), cmd))
            .await
            .map_err(|_| CalEditError::ProviderTimeout(self.timeout.as_secs()))?
    }

    async fn call_raw<P: Serialize, R: DeserializeOwned>(
        &self,
        command: Command,
        params: P,
    ) -> CalEditResult<R> {
        let params = serde_json::to_value(params)
            .map_err(|e| CalEditError::Serialization(e.to_string()))?;
        let request_json = serde_json::to_string(&Request { command, params })
            .map_err(|e| CalEditError::Serialization(e.to_string()))?;

        let binary_path = self.binary_path()?;
        debug!("Calling {} with {:?}", binary_path.display(), command);

        let mut child = TokioCommand::new(&binary_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                CalEditError::Remote(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| CalEditError::Remote("Provider stdin unavailable".into()))?;
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(CalEditError::Remote(format!(
                "Provider exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        let response_str = String::from_utf8_lossy(&output.stdout);
        if response_str.trim().is_empty() {
            return Err(CalEditError::Remote("Provider returned no response".into()));
        }

        let response: Response<R> = serde_json::from_str(&response_str)
            .map_err(|e| CalEditError::Serialization(format!("Failed to parse response: {e}")))?;

        response.into_result()
    }
}
