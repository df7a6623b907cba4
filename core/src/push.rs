//! Push payload: who receives a notification, on which platforms, and what
//! it says.
//!
//! Only the top-level shape is typed. Audience selectors and per-platform
//! overrides stay free-form JSON so new server-side options pass through
//! untouched.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::payload::JsonPayload;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushPayload {
    pub audience: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification: Option<Notification>,
    pub device_types: DeviceTypes,
    /// Rich in-app message, passed through as-is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,
}

impl PushPayload {
    pub fn new(audience: Value, device_types: DeviceTypes) -> Self {
        Self {
            audience,
            notification: None,
            device_types,
            message: None,
            options: None,
        }
    }

    /// Set the cross-platform alert text.
    pub fn with_alert(mut self, alert: impl Into<String>) -> Self {
        self.notification
            .get_or_insert_with(Notification::default)
            .alert = Some(alert.into());
        self
    }
}

impl JsonPayload for PushPayload {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ios: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub android: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Ios,
    Android,
    Amazon,
    Wns,
    Mpns,
    Blackberry,
}

/// Either every platform (`"all"`) or an explicit list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDeviceTypes", into = "RawDeviceTypes")]
pub enum DeviceTypes {
    All,
    Only(Vec<DeviceType>),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawDeviceTypes {
    Keyword(String),
    List(Vec<DeviceType>),
}

impl From<DeviceTypes> for RawDeviceTypes {
    fn from(value: DeviceTypes) -> Self {
        match value {
            DeviceTypes::All => RawDeviceTypes::Keyword("all".to_string()),
            DeviceTypes::Only(types) => RawDeviceTypes::List(types),
        }
    }
}

impl TryFrom<RawDeviceTypes> for DeviceTypes {
    type Error = String;

    fn try_from(value: RawDeviceTypes) -> Result<Self, Self::Error> {
        match value {
            RawDeviceTypes::Keyword(k) if k == "all" => Ok(DeviceTypes::All),
            RawDeviceTypes::Keyword(k) => Err(format!("unknown device_types keyword {k:?}")),
            RawDeviceTypes::List(types) => Ok(DeviceTypes::Only(types)),
        }
    }
}

/// Builders for common audience selectors.
pub struct Selector;

impl Selector {
    pub fn all() -> Value {
        Value::String("all".to_string())
    }

    pub fn tag(tag: &str) -> Value {
        json!({ "tag": tag })
    }

    pub fn alias(alias: &str) -> Value {
        json!({ "alias": alias })
    }

    pub fn device_token(token: &str) -> Value {
        json!({ "device_token": token })
    }

    pub fn apid(apid: &str) -> Value {
        json!({ "apid": apid })
    }

    pub fn ios_channel(channel: &str) -> Value {
        json!({ "ios_channel": channel })
    }

    pub fn android_channel(channel: &str) -> Value {
        json!({ "android_channel": channel })
    }

    pub fn or(selectors: Vec<Value>) -> Value {
        json!({ "or": selectors })
    }

    pub fn and(selectors: Vec<Value>) -> Value {
        json!({ "and": selectors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_serializes_to_all() {
        let payload = PushPayload::new(Selector::all(), DeviceTypes::All).with_alert("Hello");
        let json: Value = serde_json::from_str(&payload.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            json!({
                "audience": "all",
                "notification": { "alert": "Hello" },
                "device_types": "all"
            })
        );
    }

    #[test]
    fn device_type_list_serializes_lowercase() {
        let payload = PushPayload::new(
            Selector::or(vec![Selector::tag("sports"), Selector::alias("fan")]),
            DeviceTypes::Only(vec![DeviceType::Ios, DeviceType::Android]),
        );
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["device_types"], json!(["ios", "android"]));
        assert_eq!(json["audience"], json!({ "or": [{ "tag": "sports" }, { "alias": "fan" }] }));
        assert!(json.get("notification").is_none());
    }

    #[test]
    fn device_types_rejects_unknown_keyword() {
        let err = serde_json::from_value::<DeviceTypes>(json!("some")).unwrap_err();
        assert!(err.to_string().contains("unknown device_types keyword"));
        assert_eq!(
            serde_json::from_value::<DeviceTypes>(json!("all")).unwrap(),
            DeviceTypes::All
        );
    }

    #[test]
    fn platform_overrides_pass_through() {
        let raw = json!({
            "audience": { "device_token": "ABC" },
            "notification": { "ios": { "badge": "+1", "sound": "ping.caf" } },
            "device_types": ["ios"],
            "options": { "expiry": 3600 }
        });
        let payload: PushPayload = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(payload.audience, Selector::device_token("ABC"));
        assert_eq!(serde_json::to_value(&payload).unwrap(), raw);
    }
}
