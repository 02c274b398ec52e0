use serde::{Deserialize, Serialize};

// Slack Events API envelope. Only the fields the bridge routes on are kept.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct EventPayload {
    // present only on url_verification; echoed back untouched, even when null
    #[serde(default, deserialize_with = "present")]
    pub challenge: Option<serde_json::Value>,
    #[serde(rename = "type", default)]
    pub payload_type: Option<String>,
    #[serde(default)]
    pub event: Option<IncomingEvent>,
}

// A key that is present maps to `Some`, whatever its value; only a missing
// key falls back to `None` through `default`.
fn present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

// Inner `event` object of an event_callback
#[derive(Debug, Default, Deserialize, Clone, PartialEq, Eq)]
pub struct IncomingEvent {
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub channel_type: Option<String>,
}

impl IncomingEvent {
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    pub fn user(&self) -> &str {
        self.user.as_deref().unwrap_or("")
    }
}

// One entry of the /list-channels response
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ChannelSummary {
    pub id: String,
    pub name: String,
}
