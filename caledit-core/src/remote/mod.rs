//! The remote calendar the edited records are synced to.

pub mod memory;
pub mod protocol;
pub mod provider;

use std::future::Future;

use crate::config::CalEditConfig;
use crate::date_range::DateRange;
use crate::error::CalEditResult;
use crate::event::{EditHandle, Event, EventUpdate, PLACEHOLDER_TITLE};
use crate::remote::protocol::{DeleteEvent, InsertPlaceholder, ListEvents, UpdateEvent};
use crate::remote::provider::Provider;

/// Operations caledit needs from a calendar backend.
pub trait Remote {
    /// Events starting inside `range`, with their edit handles.
    fn query_events(
        &self,
        range: &DateRange,
    ) -> impl Future<Output = CalEditResult<Vec<Event>>> + Send;

    /// Insert an empty event titled `_new_event`.
    fn insert_placeholder(&self) -> impl Future<Output = CalEditResult<Event>> + Send;

    /// Replace the event's editable fields and return the stored result.
    fn update_event(
        &self,
        handle: &EditHandle,
        update: &EventUpdate,
    ) -> impl Future<Output = CalEditResult<Event>> + Send;

    fn delete_event(&self, handle: &EditHandle) -> impl Future<Output = CalEditResult<()>> + Send;
}

/// A remote backed by a `caledit-provider-{name}` binary.
#[derive(Debug, Clone)]
pub struct ProviderRemote {
    provider: Provider,
    remote_config: serde_json::Map<String, serde_json::Value>,
}

impl ProviderRemote {
    pub fn new(provider: Provider, remote_config: serde_json::Map<String, serde_json::Value>) -> Self {
        ProviderRemote {
            provider,
            remote_config,
        }
    }

    pub fn from_config(config: &CalEditConfig, account: &str) -> CalEditResult<Self> {
        let provider = Provider::from_name(&config.provider).with_timeout(config.provider_timeout()?);
        Ok(Self::new(provider, config.remote_params(account)))
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }
}

impl Remote for ProviderRemote {
    async fn query_events(&self, range: &DateRange) -> CalEditResult<Vec<Event>> {
        self.provider
            .call(ListEvents {
                remote_config: self.remote_config.clone(),
                from: range.from_iso(),
                to: range.to_iso(),
            })
            .await
    }

    async fn insert_placeholder(&self) -> CalEditResult<Event> {
        self.provider
            .call(InsertPlaceholder {
                remote_config: self.remote_config.clone(),
                title: PLACEHOLDER_TITLE.to_string(),
            })
            .await
    }

    async fn update_event(&self, handle: &EditHandle, update: &EventUpdate) -> CalEditResult<Event> {
        self.provider
            .call(UpdateEvent {
                remote_config: self.remote_config.clone(),
                handle: handle.clone(),
                update: update.clone(),
            })
            .await
    }

    async fn delete_event(&self, handle: &EditHandle) -> CalEditResult<()> {
        self.provider
            .call(DeleteEvent {
                remote_config: self.remote_config.clone(),
                handle: handle.clone(),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_applies_timeout_and_params() {
        let config = CalEditConfig {
            provider_timeout: "5s".into(),
            ..Default::default()
        };
        let remote = ProviderRemote::from_config(&config, "me@example.com").unwrap();
        assert_eq!(remote.provider().name(), "google");
        assert_eq!(remote.remote_config["google_account"], "me@example.com");
    }

    #[test]
    fn from_config_rejects_bad_timeout() {
        let config = CalEditConfig {
            provider_timeout: "whenever".into(),
            ..Default::default()
        };
        assert!(ProviderRemote::from_config(&config, "me@example.com").is_err());
    }
}
