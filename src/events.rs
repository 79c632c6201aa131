use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

use crate::error::BridgeError;
use crate::widgets::WidgetKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WidgetEventAction {
    Created,
    Updated,
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    ProcessingError,
    ValidationError,
}

/// Events emitted to in-page collaborators (popup UI, other features).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum BridgeEvent {
    Registered {
        script_id: String,
        script_name: Option<String>,
        version: Option<String>,
        capabilities: Vec<String>,
    },
    Pong {
        data: Option<Value>,
        timestamp: Option<f64>,
        received_at_ms: u64,
        registered_scripts: usize,
    },
    Cleared {
        widgets: usize,
    },
    Widget {
        action: WidgetEventAction,
        widget_id: String,
        widget_type: Option<WidgetKind>,
    },
    Error {
        #[serde(rename = "type")]
        kind: ErrorKind,
        message: String,
        widget_id: Option<String>,
        reasons: Vec<String>,
    },
}

impl BridgeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Registered { .. } => "registered",
            Self::Pong { .. } => "pong",
            Self::Cleared { .. } => "cleared",
            Self::Widget { .. } => "widget",
            Self::Error { .. } => "error",
        }
    }

    /// Widget errors surface as `validation_error`, anything else as
    /// `processing_error`.
    pub fn from_error(err: &BridgeError, widget_id: Option<&str>) -> Self {
        match err {
            BridgeError::Widget(e) => Self::Error {
                kind: ErrorKind::ValidationError,
                message: e.to_string(),
                widget_id: e.widget_id().or(widget_id).map(str::to_string),
                reasons: e.reasons(),
            },
            other => Self::Error {
                kind: ErrorKind::ProcessingError,
                message: other.to_string(),
                widget_id: widget_id.map(str::to_string),
                reasons: Vec::new(),
            },
        }
    }
}

pub type EventSender = broadcast::Sender<BridgeEvent>;
pub type EventReceiver = broadcast::Receiver<BridgeEvent>;

/// Create a broadcast event bus with the given capacity.
pub fn event_bus(capacity: usize) -> (EventSender, EventReceiver) {
    broadcast::channel(capacity.max(1))
}

/// Send without caring whether anyone is listening.
pub fn emit(tx: &EventSender, event: BridgeEvent) {
    tracing::debug!(event = event.name(), "emitting bridge event");
    if tx.send(event).is_err() {
        tracing::trace!("no event subscribers");
    }
}

/// Everything currently queued on `rx`. Lagged receivers skip what they missed.
pub fn drain(rx: &mut EventReceiver) -> Vec<BridgeEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event receiver lagged");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => return events,
        }
    }
}
