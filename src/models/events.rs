//! Telemetry event models
//!
//! The three durable event kinds the signal extractor reads. Login and file
//! access events are immutable once written; device events upsert on
//! device_id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LoginEvent {
    pub user_id: String,
    #[sqlx(rename = "login_time")]
    pub timestamp: DateTime<Utc>,
    #[sqlx(rename = "ip_address")]
    pub source_ip: String,
    #[sqlx(rename = "success")]
    pub succeeded: bool,
    pub country: String,
    pub city: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeviceEvent {
    pub user_id: String,
    /// Unique per physical device fingerprint
    pub device_id: String,
    pub mac_address: String,
    pub os: String,
    pub wifi_ssid: String,
    pub hostname: String,
    pub ip_address: String,
    pub trusted: bool,
    pub first_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum FileAction {
    Read,
    Write,
    Delete,
}

impl FileAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::Delete => "DELETE",
        }
    }

    /// Parse a wire-format action; anything else is a validation failure.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "READ" => Some(Self::Read),
            "WRITE" => Some(Self::Write),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FileAccessEvent {
    pub user_id: String,
    pub file_name: String,
    pub action: FileAction,
    pub ip_address: String,
    #[sqlx(rename = "access_time")]
    pub timestamp: DateTime<Utc>,
}
