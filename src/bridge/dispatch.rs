use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::dom::Document;
use crate::error::{BridgeError, WidgetError};
use crate::events::{BridgeEvent, EventSender, WidgetEventAction, emit};
use crate::protocol::{PingMessage, ProtocolMessage, RegisterMessage, WidgetAction, WidgetMessage};
use crate::widgets::WidgetRegistry;

/// A userscript that announced itself with `register`.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredScript {
    pub script_id: String,
    pub script_name: Option<String>,
    pub version: Option<String>,
    pub capabilities: Vec<String>,
    pub registered_at: DateTime<Utc>,
}

/// What one dispatched message amounted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Registered,
    Pong,
    Cleared(usize),
    Widget(WidgetEventAction),
    /// `destroy` for an id that was never created.
    Ignored,
    /// The handler failed; an `error` event has been emitted.
    Failed,
}

/// Fans a parsed message out to its handler. Failures never escape: they are
/// logged and surfaced as `error` events.
#[derive(Debug)]
pub struct Dispatcher {
    scripts: BTreeMap<String, RegisteredScript>,
    events: EventSender,
}

impl Dispatcher {
    pub fn new(events: EventSender) -> Self {
        Self {
            scripts: BTreeMap::new(),
            events,
        }
    }

    pub fn dispatch(
        &mut self,
        message: &ProtocolMessage,
        doc: &mut Document,
        widgets: &mut WidgetRegistry,
        now_ms: u64,
    ) -> DispatchOutcome {
        tracing::debug!(message_type = %message.message_type(), "dispatching message");
        let result = match message {
            ProtocolMessage::Register(msg) => Ok(self.handle_register(msg)),
            ProtocolMessage::Ping(msg) => Ok(self.handle_ping(msg, now_ms)),
            ProtocolMessage::ClearAll => Ok(self.handle_clear_all(doc, widgets)),
            ProtocolMessage::Widget(msg) => Self::handle_widget(msg, doc, widgets),
        };
        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                let widget_id = match message {
                    ProtocolMessage::Widget(msg) => msg.id(),
                    _ => None,
                };
                tracing::warn!(
                    message_type = %message.message_type(),
                    widget_id = widget_id.unwrap_or_default(),
                    "message handler failed: {e}"
                );
                emit(&self.events, BridgeEvent::from_error(&e, widget_id));
                DispatchOutcome::Failed
            }
        }
    }

    pub fn scripts(&self) -> impl Iterator<Item = &RegisteredScript> {
        self.scripts.values()
    }

    pub fn script(&self, script_id: &str) -> Option<&RegisteredScript> {
        self.scripts.get(script_id)
    }

    pub fn clear_scripts(&mut self) {
        self.scripts.clear();
    }

    fn handle_register(&mut self, msg: &RegisterMessage) -> DispatchOutcome {
        let script = RegisteredScript {
            script_id: msg.script_id.clone(),
            script_name: msg.script_name.clone(),
            version: msg.version.clone(),
            capabilities: msg.capabilities.clone(),
            registered_at: Utc::now(),
        };
        let replaced = self.scripts.insert(msg.script_id.clone(), script).is_some();
        tracing::info!(
            script_id = %msg.script_id,
            script_name = msg.script_name.as_deref().unwrap_or_default(),
            replaced,
            "script registered"
        );
        emit(
            &self.events,
            BridgeEvent::Registered {
                script_id: msg.script_id.clone(),
                script_name: msg.script_name.clone(),
                version: msg.version.clone(),
                capabilities: msg.capabilities.clone(),
            },
        );
        DispatchOutcome::Registered
    }

    fn handle_ping(&self, msg: &PingMessage, now_ms: u64) -> DispatchOutcome {
        emit(
            &self.events,
            BridgeEvent::Pong {
                data: msg.data.clone(),
                timestamp: msg.timestamp,
                received_at_ms: now_ms,
                registered_scripts: self.scripts.len(),
            },
        );
        DispatchOutcome::Pong
    }

    fn handle_clear_all(&self, doc: &mut Document, widgets: &mut WidgetRegistry) -> DispatchOutcome {
        let cleared = widgets.clear_all(doc);
        tracing::info!(widgets = cleared, "cleared all widgets");
        emit(&self.events, BridgeEvent::Cleared { widgets: cleared });
        DispatchOutcome::Cleared(cleared)
    }

    /// Registry failures are reported by the registry itself; only errors
    /// raised here are returned for the dispatch boundary to report.
    fn handle_widget(
        msg: &WidgetMessage,
        doc: &mut Document,
        widgets: &mut WidgetRegistry,
    ) -> Result<DispatchOutcome, BridgeError> {
        let id = msg.id().ok_or(WidgetError::MissingId)?;
        let result = match msg.action {
            WidgetAction::Destroy => widgets.destroy(doc, id).map(|removed| {
                if removed {
                    DispatchOutcome::Widget(WidgetEventAction::Destroyed)
                } else {
                    DispatchOutcome::Ignored
                }
            }),
            action @ (WidgetAction::Create | WidgetAction::Update) => {
                let payload = msg.payload().ok_or_else(|| WidgetError::MissingConfig {
                    id: id.to_string(),
                    action: action.to_string(),
                })?;
                let applied = if action == WidgetAction::Create {
                    widgets.create(doc, id, payload)
                } else {
                    widgets.update(doc, id, payload)
                };
                applied.map(DispatchOutcome::Widget)
            }
        };
        Ok(result.unwrap_or(DispatchOutcome::Failed))
    }
}
