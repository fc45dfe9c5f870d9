//! Status notifications (`onStatus`).

use serde::{Deserialize, Serialize};

use crate::codec::Value;

/// Severity of a status notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    /// Informational outcome.
    Status,
    /// Failure outcome.
    Error,
}

impl StatusLevel {
    /// Wire string of this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusLevel::Status => "status",
            StatusLevel::Error => "error",
        }
    }
}

/// Well-known status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCode {
    /// `NetStream.Connect.Success`
    #[serde(rename = "NetStream.Connect.Success")]
    ConnectSuccess,
    /// `NetStream.Connect.Failed`
    #[serde(rename = "NetStream.Connect.Failed")]
    ConnectFailed,
    /// `NetStream.MulticastStream.Reset`
    #[serde(rename = "NetStream.MulticastStream.Reset")]
    MulticastStreamReset,
    /// `NetStream.Play.Start`
    #[serde(rename = "NetStream.Play.Start")]
    PlayStart,
    /// `NetStream.Play.Failed`
    #[serde(rename = "NetStream.Play.Failed")]
    PlayFailed,
    /// `NetStream.Play.Complete`
    #[serde(rename = "NetStream.Play.Complete")]
    PlayComplete,
    /// `NetStream.Publish.BadName`
    #[serde(rename = "NetStream.Publish.BadName")]
    PublishBadName,
    /// `NetStream.Publish.Failed`
    #[serde(rename = "NetStream.Publish.Failed")]
    PublishFailed,
    /// `NetStream.Publish.Start`
    #[serde(rename = "NetStream.Publish.Start")]
    PublishStart,
    /// `NetStream.Unpublish.Success`
    #[serde(rename = "NetStream.Unpublish.Success")]
    UnpublishSuccess,
}

impl StatusCode {
    /// Wire string of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCode::ConnectSuccess => "NetStream.Connect.Success",
            StatusCode::ConnectFailed => "NetStream.Connect.Failed",
            StatusCode::MulticastStreamReset => "NetStream.MulticastStream.Reset",
            StatusCode::PlayStart => "NetStream.Play.Start",
            StatusCode::PlayFailed => "NetStream.Play.Failed",
            StatusCode::PlayComplete => "NetStream.Play.Complete",
            StatusCode::PublishBadName => "NetStream.Publish.BadName",
            StatusCode::PublishFailed => "NetStream.Publish.Failed",
            StatusCode::PublishStart => "NetStream.Publish.Start",
            StatusCode::UnpublishSuccess => "NetStream.Unpublish.Success",
        }
    }

    /// Parse a wire string from the well-known set.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NetStream.Connect.Success" => Some(StatusCode::ConnectSuccess),
            "NetStream.Connect.Failed" => Some(StatusCode::ConnectFailed),
            "NetStream.MulticastStream.Reset" => Some(StatusCode::MulticastStreamReset),
            "NetStream.Play.Start" => Some(StatusCode::PlayStart),
            "NetStream.Play.Failed" => Some(StatusCode::PlayFailed),
            "NetStream.Play.Complete" => Some(StatusCode::PlayComplete),
            "NetStream.Publish.BadName" => Some(StatusCode::PublishBadName),
            "NetStream.Publish.Failed" => Some(StatusCode::PublishFailed),
            "NetStream.Publish.Start" => Some(StatusCode::PublishStart),
            "NetStream.Unpublish.Success" => Some(StatusCode::UnpublishSuccess),
            _ => None,
        }
    }
}

/// The info object carried by a status notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInfo {
    /// Severity.
    pub level: StatusLevel,
    /// Well-known code.
    pub code: StatusCode,
    /// Free-text description.
    pub description: String,
}

impl StatusInfo {
    /// Informational notification.
    pub fn status(code: StatusCode, description: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Status,
            code,
            description: description.into(),
        }
    }

    /// Failure notification.
    pub fn error(code: StatusCode, description: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            code,
            description: description.into(),
        }
    }

    /// Key-ordered object for the wire encoding.
    pub fn to_value(&self) -> Value {
        Value::Object(vec![
            ("level".to_string(), Value::from(self.level.as_str())),
            ("code".to_string(), Value::from(self.code.as_str())),
            (
                "description".to_string(),
                Value::from(self.description.as_str()),
            ),
        ])
    }

    /// Parse an info object received on the wire.
    pub fn from_value(value: &Value) -> Option<Self> {
        let level = match value.get("level")?.as_str()? {
            "status" => StatusLevel::Status,
            "error" => StatusLevel::Error,
            _ => return None,
        };
        let code = StatusCode::parse(value.get("code")?.as_str()?)?;
        let description = value
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Some(Self {
            level,
            code,
            description,
        })
    }
}
