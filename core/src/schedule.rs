//! Scheduled push payload.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::payload::JsonPayload;
use crate::push::PushPayload;

/// A push to be sent at a fixed time.
///
/// `url` is assigned by the server and only present on schedules read back
/// from the API; it is omitted when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub schedule: Schedule,
    pub push: PushPayload,
}

impl SchedulePayload {
    pub fn new(scheduled_time: NaiveDateTime, push: PushPayload) -> Self {
        Self {
            url: None,
            name: None,
            schedule: Schedule { scheduled_time },
            push,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Schedule id: the last path segment of `url`.
    pub fn id(&self) -> Option<&str> {
        self.url
            .as_deref()
            .and_then(|url| url.trim_end_matches('/').rsplit('/').next())
            .filter(|id| !id.is_empty())
    }
}

impl JsonPayload for SchedulePayload {}

/// Sort order for paginated schedule listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// UTC, second precision.
    #[serde(with = "scheduled_time")]
    pub scheduled_time: NaiveDateTime,
}

mod scheduled_time {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), FORMAT).map_err(de::Error::custom)
    }
}
