use super::{config, note_list::NoteList};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub notes: Arc<Mutex<NoteList>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Note {
    pub id: String,
    pub text: String,
    /// Notes written by other clients may not carry a timestamp.
    pub created_at: Option<DateTime<Utc>>,
    /// UI-only; never written to the store.
    pub is_editing: bool,
}

impl Note {
    pub fn from_value(id: String, value: NoteValue) -> Self {
        Note {
            id,
            text: value.text,
            created_at: value.created_at,
            is_editing: false,
        }
    }

    pub fn to_value(&self) -> NoteValue {
        NoteValue {
            text: self.text.clone(),
            created_at: self.created_at,
        }
    }
}

/// The JSON document stored under each `note:<millis>` key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoteValue {
    pub text: String,
    #[serde(
        rename = "createdAt",
        default,
        with = "iso_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

/// One key/value pair out of a prefix scan.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub key: String,
    pub value: serde_json::Value,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ToastStatus {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Toast {
    pub title: &'static str,
    pub description: Option<&'static str>,
    pub status: ToastStatus,
    pub duration: Duration,
    pub is_closable: bool,
}

impl Toast {
    pub fn success(title: &'static str) -> Self {
        Toast {
            title,
            description: None,
            status: ToastStatus::Success,
            duration: Duration::from_millis(config::TOAST_DURATION_MS),
            is_closable: true,
        }
    }

    pub fn error(title: &'static str, description: &'static str) -> Self {
        Toast {
            title,
            description: Some(description),
            status: ToastStatus::Error,
            duration: Duration::from_millis(config::TOAST_DURATION_MS),
            is_closable: true,
        }
    }
}

/// Timestamps go over the wire the way browsers print them:
/// `2023-07-14T09:26:53.589Z`. Other clients may write something else there;
/// anything that is not RFC 3339 reads as "no timestamp".
mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer
                .serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(match raw {
            Value::Null => None,
            Value::String(s) => match DateTime::parse_from_rfc3339(&s) {
                Ok(dt) => Some(dt.with_timezone(&Utc)),
                Err(e) => {
                    log::warn!("ignoring createdAt {s:?}: {e}");
                    None
                }
            },
            other => {
                log::warn!("ignoring createdAt {other}: not a string");
                None
            }
        })
    }
}
