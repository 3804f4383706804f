//! JSON messages exchanged with provider binaries over stdin/stdout.
//!
//! Each call is one request line and one response line:
//!
//! ```text
//! {"command": "update_event", "params": {...}}
//! {"status": "success", "data": {...}}
//! {"status": "error", "error": "Rate limit exceeded", "kind": "transient"}
//! ```

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::{CalEditError, CalEditResult};
use crate::event::{EditHandle, Event, EventUpdate};

pub trait ProviderCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    ListEvents,
    InsertPlaceholder,
    UpdateEvent,
    DeleteEvent,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// How a provider classifies a failed call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Worth retrying: rate limits, 5xx, dropped connections
    Transient,
    /// The backend rejected the change because of another event
    Conflict,
    #[default]
    Fatal,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success {
        data: T,
    },
    Error {
        error: String,
        #[serde(default)]
        kind: ErrorKind,
    },
}

impl<T> Response<T> {
    pub fn into_result(self) -> CalEditResult<T> {
        match self {
            Response::Success { data } => Ok(data),
            Response::Error { error, kind } => Err(match kind {
                ErrorKind::Transient => CalEditError::RemoteTransient(error),
                ErrorKind::Conflict => CalEditError::conflict(error),
                ErrorKind::Fatal => CalEditError::Remote(error),
            }),
        }
    }
}

/// List events starting inside a window.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListEvents {
    /// Provider-specific config (e.g., google_account, google_calendar_id)
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub from: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

impl ProviderCommand for ListEvents {
    type Response = Vec<Event>;
    fn command() -> Command {
        Command::ListEvents
    }
}

/// Insert an empty event titled `_new_event` to be filled in by an update.
#[derive(Debug, Serialize, Deserialize)]
pub struct InsertPlaceholder {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub title: String,
}

impl ProviderCommand for InsertPlaceholder {
    type Response = Event;
    fn command() -> Command {
        Command::InsertPlaceholder
    }
}

/// Replace every editable field of an event.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateEvent {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub handle: EditHandle,
    pub update: EventUpdate,
}

impl ProviderCommand for UpdateEvent {
    type Response = Event;
    fn command() -> Command {
        Command::UpdateEvent
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteEvent {
    #[serde(flatten)]
    pub remote_config: serde_json::Map<String, serde_json::Value>,
    pub handle: EditHandle,
}

impl ProviderCommand for DeleteEvent {
    type Response = ();
    fn command() -> Command {
        Command::DeleteEvent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_flattens_remote_config() {
        let mut remote_config = serde_json::Map::new();
        remote_config.insert("google_account".into(), "me@example.com".into());
        let params = serde_json::to_value(DeleteEvent {
            remote_config,
            handle: EditHandle::new("edit/abc"),
        })
        .unwrap();
        let request = Request {
            command: DeleteEvent::command(),
            params,
        };

        let json: serde_json::Value = serde_json::to_value(&request).unwrap();
        assert_eq!(json["command"], "delete_event");
        assert_eq!(json["params"]["google_account"], "me@example.com");
        assert_eq!(json["params"]["handle"], "edit/abc");
    }

    #[test]
    fn open_window_omits_upper_bound() {
        let json = serde_json::to_value(ListEvents {
            remote_config: serde_json::Map::new(),
            from: "2011-06-13T00:00-04:00".into(),
            to: None,
        })
        .unwrap();
        assert!(json.get("to").is_none());
    }

    #[test]
    fn success_response_yields_data() {
        let response: Response<Vec<Event>> =
            serde_json::from_str(r#"{"status":"success","data":[]}"#).unwrap();
        assert!(response.into_result().unwrap().is_empty());
    }

    #[test]
    fn error_kinds_map_to_errors() {
        let parse = |json: &str| {
            serde_json::from_str::<Response<()>>(json)
                .unwrap()
                .into_result()
                .unwrap_err()
        };

        let err = parse(r#"{"status":"error","error":"Rate limit","kind":"transient"}"#);
        assert!(err.is_transient());

        let err = parse(r#"{"status":"error","error":"Room is booked","kind":"conflict"}"#);
        assert!(matches!(err, CalEditError::Conflict(ref m) if m == "Room is booked"));

        let err = parse(r#"{"status":"error","error":"","kind":"conflict"}"#);
        assert_eq!(err.to_string(), "event conflicts with existing event");

        let err = parse(r#"{"status":"error","error":"Not found"}"#);
        assert!(matches!(err, CalEditError::Remote(ref m) if m == "Not found"));
        assert!(!err.is_transient());
    }
}
