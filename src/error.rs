use thiserror::Error;

use crate::dom::NodeId;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `bdbridge`.
///
/// Each subsystem defines its own error variant. Callers at the host boundary
/// match on these to decide which event to emit; config loading and the CLI
/// continue to use `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum BridgeError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Protocol framing / parsing ──────────────────────────────────────
    #[error("protocol: {0}")]
    Protocol(#[from] ProtocolError),

    // ── Widgets ─────────────────────────────────────────────────────────
    #[error("widget: {0}")]
    Widget(#[from] WidgetError),

    // ── Host DOM ────────────────────────────────────────────────────────
    #[error("dom: {0}")]
    Dom(#[from] DomError),

    // ── Settings store ──────────────────────────────────────────────────
    #[error("settings: {0}")]
    Settings(#[from] SettingsError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Protocol errors ─────────────────────────────────────────────────────────

/// Why a single protocol span was not dispatched.
///
/// None of these abort processing of the surrounding text: the offending span
/// is skipped (and still stripped), adjacent spans are handled normally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("message body is {size} bytes, limit is {limit}")]
    Oversize { size: usize, limit: usize },

    #[error("invalid JSON payload: {0}")]
    Parse(String),

    #[error("invalid message: {0}")]
    Validation(String),
}

impl ProtocolError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Oversize { .. } => "oversize",
            Self::Parse(_) => "parse",
            Self::Validation(_) => "validation",
        }
    }
}

// ─── Widget errors ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WidgetError {
    #[error("invalid config for widget '{id}': {}", reasons.join("; "))]
    Validation { id: String, reasons: Vec<String> },

    #[error("widget '{id}' is a {stored} widget, refusing {incoming} update")]
    TypeMismatch {
        id: String,
        stored: String,
        incoming: String,
    },

    #[error("widget message has neither widgetId nor target")]
    MissingId,

    #[error("widget {action} for '{id}' requires a config object")]
    MissingConfig { id: String, action: String },
}

impl WidgetError {
    /// Human-readable reasons carried on the emitted `validation_error` event.
    pub fn reasons(&self) -> Vec<String> {
        match self {
            Self::Validation { reasons, .. } => reasons.clone(),
            other => vec![other.to_string()],
        }
    }

    pub fn widget_id(&self) -> Option<&str> {
        match self {
            Self::Validation { id, .. }
            | Self::TypeMismatch { id, .. }
            | Self::MissingConfig { id, .. } => Some(id),
            Self::MissingId => None,
        }
    }
}

// ─── DOM errors ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("node {0} no longer exists")]
    StaleNode(NodeId),

    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("cannot append node {child} under its own descendant {parent}")]
    Cycle { parent: NodeId, child: NodeId },
}

// ─── Settings errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Read(String),

    #[error("failed to write settings: {0}")]
    Write(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
