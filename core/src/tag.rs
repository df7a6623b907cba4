//! Tag modification payloads.

use serde::{Deserialize, Serialize};

use crate::payload::JsonPayload;

/// Devices to add to and remove from a single tag, grouped by identifier
/// kind. Kinds left as `None` are omitted from the body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddRemoveDeviceFromTagPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ios_channels: Option<AddRemove>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub android_channels: Option<AddRemove>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_tokens: Option<AddRemove>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apids: Option<AddRemove>,
}

impl JsonPayload for AddRemoveDeviceFromTagPayload {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddRemove {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove: Vec<String>,
}

impl AddRemove {
    pub fn add<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            add: ids.into_iter().map(Into::into).collect(),
            remove: Vec::new(),
        }
    }

    pub fn remove<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            add: Vec::new(),
            remove: ids.into_iter().map(Into::into).collect(),
        }
    }
}

/// Replace the full tag set of many devices in one call. Serialized as a
/// bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchModificationPayload(pub Vec<BatchTagSet>);

impl BatchModificationPayload {
    pub fn push(&mut self, device: DeviceIdentifier, tags: Vec<String>) {
        self.0.push(BatchTagSet { device, tags });
    }
}

impl JsonPayload for BatchModificationPayload {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTagSet {
    #[serde(flatten)]
    pub device: DeviceIdentifier,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceIdentifier {
    IosChannel(String),
    AndroidChannel(String),
    DeviceToken(String),
    Apid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn add_remove_omits_empty_sides() {
        let payload = AddRemoveDeviceFromTagPayload {
            device_tokens: Some(AddRemove::add(["AAA", "BBB"])),
            apids: Some(AddRemove::remove(["c2c0f5d6"])),
            ..Default::default()
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            json!({
                "device_tokens": { "add": ["AAA", "BBB"] },
                "apids": { "remove": ["c2c0f5d6"] }
            })
        );
    }

    #[test]
    fn batch_serializes_as_array_of_identifier_entries() {
        let mut payload = BatchModificationPayload::default();
        payload.push(
            DeviceIdentifier::DeviceToken("AAA".into()),
            vec!["tag1".into(), "tag2".into()],
        );
        payload.push(DeviceIdentifier::IosChannel("9c36e8c7".into()), Vec::new());
        let json: serde_json::Value = serde_json::from_str(&payload.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            json!([
                { "device_token": "AAA", "tags": ["tag1", "tag2"] },
                { "ios_channel": "9c36e8c7", "tags": [] }
            ])
        );
    }
}
