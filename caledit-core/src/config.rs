//! caledit configuration at ~/.config/caledit/config.toml.
//!
//! Every key can also be set through a `CALEDIT_*` environment variable
//! (`CALEDIT_ACCOUNT`, `CALEDIT_SECRET`, `CALEDIT_RETRY_ATTEMPTS`, ...),
//! which takes precedence over the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{CalEditError, CalEditResult};
use crate::sync::RetryPolicy;

const DEFAULT_PROVIDER: &str = "google";
const DEFAULT_CALENDAR_ID: &str = "primary";
const DEFAULT_EDITOR: &str = "vim";
const DEFAULT_RETRY_ATTEMPTS: u32 = 15;
const DEFAULT_RETRY_PAUSE: &str = "1s";
const DEFAULT_PROVIDER_TIMEOUT: &str = "30s";

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_calendar_id() -> String {
    DEFAULT_CALENDAR_ID.to_string()
}

fn default_retry_attempts() -> u32 {
    DEFAULT_RETRY_ATTEMPTS
}

fn default_retry_pause() -> String {
    DEFAULT_RETRY_PAUSE.to_string()
}

fn default_provider_timeout() -> String {
    DEFAULT_PROVIDER_TIMEOUT.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalEditConfig {
    /// Provider binary suffix: `caledit-provider-{provider}`
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Account to log in with when `--account` is not given
    #[serde(default)]
    pub account: Option<String>,

    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,

    /// Passed to the provider untouched
    #[serde(default)]
    pub secret: Option<String>,

    #[serde(default)]
    pub editor: Option<String>,

    /// Where the edit session's scratch file is written
    #[serde(default)]
    pub temp_dir: Option<String>,

    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(default = "default_retry_pause")]
    pub retry_pause: String,

    #[serde(default = "default_provider_timeout")]
    pub provider_timeout: String,
}

impl Default for CalEditConfig {
    fn default() -> Self {
        CalEditConfig {
            provider: default_provider(),
            account: None,
            calendar_id: default_calendar_id(),
            secret: None,
            editor: None,
            temp_dir: None,
            retry_attempts: default_retry_attempts(),
            retry_pause: default_retry_pause(),
            provider_timeout: default_provider_timeout(),
        }
    }
}

impl CalEditConfig {
    pub fn config_path() -> CalEditResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalEditError::Config("Could not determine config directory".into()))?
            .join("caledit");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config file (creating a commented default on first run)
    /// layered with `CALEDIT_*` environment variables.
    pub fn load() -> CalEditResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Config::builder()
            .add_source(File::from(config_path).required(false))
            .add_source(Environment::with_prefix("CALEDIT").try_parsing(true))
            .build()
            .map_err(|e| CalEditError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalEditError::Config(e.to_string()))
    }

    /// Load a single config file, ignoring the environment.
    pub fn load_from(path: &Path) -> CalEditResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .build()
            .map_err(|e| CalEditError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalEditError::Config(e.to_string()))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> CalEditResult<()> {
        let contents = format!(
            "\
# caledit configuration

# Calendar provider, run as caledit-provider-<name>:
# provider = \"{DEFAULT_PROVIDER}\"

# Account to log in with when --account is not given:
# account = \"you@example.com\"

# Calendar to list and edit:
# calendar_id = \"{DEFAULT_CALENDAR_ID}\"

# Editor for --edit (defaults to $EDITOR, then {DEFAULT_EDITOR}):
# editor = \"vim\"

# Directory for the scratch file used while editing:
# temp_dir = \"~/tmp\"

# Attempts per update before giving up, and the pause between them:
# retry_attempts = {DEFAULT_RETRY_ATTEMPTS}
# retry_pause = \"{DEFAULT_RETRY_PAUSE}\"

# How long a single provider call may take:
# provider_timeout = \"{DEFAULT_PROVIDER_TIMEOUT}\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalEditError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CalEditError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn retry_policy(&self) -> CalEditResult<RetryPolicy> {
        if self.retry_attempts == 0 {
            return Err(CalEditError::Config(
                "retry_attempts must be at least 1".into(),
            ));
        }
        Ok(RetryPolicy {
            max_attempts: self.retry_attempts,
            pause: parse_duration("retry_pause", &self.retry_pause)?,
        })
    }

    pub fn provider_timeout(&self) -> CalEditResult<Duration> {
        parse_duration("provider_timeout", &self.provider_timeout)
    }

    /// The configured editor, else `$EDITOR`, else vim.
    pub fn editor(&self) -> String {
        self.editor
            .clone()
            .filter(|e| !e.trim().is_empty())
            .or_else(|| std::env::var("EDITOR").ok().filter(|e| !e.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_EDITOR.to_string())
    }

    pub fn temp_dir(&self) -> PathBuf {
        match &self.temp_dir {
            Some(dir) => PathBuf::from(shellexpand::tilde(dir).into_owned()),
            None => std::env::temp_dir(),
        }
    }

    /// Parameters sent with every provider call, keyed the way providers
    /// expect them (`google_account`, `google_calendar_id`, ...).
    pub fn remote_params(&self, account: &str) -> serde_json::Map<String, serde_json::Value> {
        let mut params = serde_json::Map::new();
        params.insert(format!("{}_account", self.provider), account.into());
        params.insert(
            format!("{}_calendar_id", self.provider),
            self.calendar_id.clone().into(),
        );
        if let Some(secret) = &self.secret {
            params.insert("secret".into(), secret.clone().into());
        }
        params
    }
}

fn parse_duration(key: &str, value: &str) -> CalEditResult<Duration> {
    humantime::parse_duration(value)
        .map_err(|e| CalEditError::Config(format!("Invalid {key} '{value}': {e}")))
}
