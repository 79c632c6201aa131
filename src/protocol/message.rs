use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum MessageType {
    Register,
    Widget,
    Ping,
    ClearAll,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterMessage {
    pub script_id: String,
    #[serde(default)]
    pub script_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WidgetAction {
    #[default]
    Create,
    Update,
    Destroy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetMessage {
    #[serde(default)]
    pub widget_id: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub action: WidgetAction,
    #[serde(default)]
    pub config: Option<Map<String, Value>>,
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
}

impl WidgetMessage {
    /// `widgetId`, falling back to `target`.
    pub fn id(&self) -> Option<&str> {
        self.widget_id
            .as_deref()
            .or(self.target.as_deref())
            .filter(|id| !id.is_empty())
    }

    /// `config`, falling back to `data`.
    pub fn payload(&self) -> Option<&Map<String, Value>> {
        self.config.as_ref().or(self.data.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PingMessage {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolMessage {
    Register(RegisterMessage),
    Widget(WidgetMessage),
    Ping(PingMessage),
    ClearAll,
}

impl ProtocolMessage {
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Register(_) => MessageType::Register,
            Self::Widget(_) => MessageType::Widget,
            Self::Ping(_) => MessageType::Ping,
            Self::ClearAll => MessageType::ClearAll,
        }
    }
}

/// A decoded message plus the protocol version it claimed, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub message: ProtocolMessage,
    pub version: Option<String>,
}
