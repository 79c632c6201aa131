//! In-band message protocol: `[[BD:<json>:BD]]` spans embedded in story text.

pub mod dedup;
pub mod framing;
pub mod message;
pub mod parser;

pub use dedup::{DedupCache, fingerprint};
pub use framing::{PREFIX, SUFFIX, Span, contains_prefix, find_spans, strip_spans};
pub use message::{
    Envelope, MessageType, PingMessage, ProtocolMessage, RegisterMessage, WidgetAction,
    WidgetMessage,
};
pub use parser::{ParsedSpan, Parser, SUPPORTED_VERSION};
