use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::dedup::fingerprint;
use super::framing::{Span, find_spans};
use super::message::{Envelope, MessageType, ProtocolMessage, WidgetMessage};
use crate::error::ProtocolError;
use crate::utils::truncate_with_ellipsis;

pub const SUPPORTED_VERSION: &str = "1.0";

/// Default body limit (16 KiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024;

/// One span found in a text block together with its parse outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSpan<'a> {
    pub span: Span<'a>,
    pub fingerprint: u32,
    pub outcome: Result<Envelope, ProtocolError>,
}

/// Pure text-in, messages-out decoder. Stripping the matched spans from the
/// page is the caller's job.
#[derive(Debug, Clone)]
pub struct Parser {
    max_body_bytes: usize,
    supported_version: String,
    supported_major: Option<u32>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BODY_BYTES, SUPPORTED_VERSION)
    }
}

impl Parser {
    pub fn new(max_body_bytes: usize, supported_version: &str) -> Self {
        Self {
            max_body_bytes,
            supported_version: supported_version.to_string(),
            supported_major: major_version(supported_version),
        }
    }

    pub fn parse_text<'a>(&self, text: &'a str) -> Vec<ParsedSpan<'a>> {
        find_spans(text)
            .into_iter()
            .map(|span| {
                let outcome = self.parse_body(span.body);
                if let Err(e) = &outcome {
                    tracing::warn!(
                        kind = e.kind(),
                        body = %truncate_with_ellipsis(span.body, 80),
                        "skipping protocol span: {e}"
                    );
                }
                ParsedSpan {
                    fingerprint: fingerprint(span.body),
                    span,
                    outcome,
                }
            })
            .collect()
    }

    pub fn parse_body(&self, body: &str) -> Result<Envelope, ProtocolError> {
        if body.len() > self.max_body_bytes {
            return Err(ProtocolError::Oversize {
                size: body.len(),
                limit: self.max_body_bytes,
            });
        }

        let value: Value =
            serde_json::from_str(body).map_err(|e| ProtocolError::Parse(e.to_string()))?;
        let Value::Object(map) = value else {
            return Err(ProtocolError::Validation(
                "payload must be a JSON object".into(),
            ));
        };

        let message_type = match map.get("type") {
            None => return Err(ProtocolError::Validation("missing type field".into())),
            Some(Value::String(name)) => MessageType::from_str(name).map_err(|_| {
                ProtocolError::Validation(format!("unknown message type '{name}'"))
            })?,
            Some(_) => return Err(ProtocolError::Validation("type must be a string".into())),
        };

        let version = match map.get("v") {
            Some(Value::String(v)) => Some(v.clone()),
            Some(other) => {
                tracing::warn!(v = %other, "ignoring non-string protocol version");
                None
            }
            None => None,
        };
        if let Some(v) = &version {
            self.check_version(v);
        }

        let message = match message_type {
            MessageType::Register => ProtocolMessage::Register(decode(message_type, map)?),
            MessageType::Widget => {
                let widget: WidgetMessage = decode(message_type, map)?;
                if widget.id().is_none() {
                    return Err(ProtocolError::Validation(
                        "widget message needs widgetId or target".into(),
                    ));
                }
                ProtocolMessage::Widget(widget)
            }
            MessageType::Ping => ProtocolMessage::Ping(decode(message_type, map)?),
            MessageType::ClearAll => ProtocolMessage::ClearAll,
        };

        Ok(Envelope { message, version })
    }

    /// Version mismatches are advisory: warn and keep going.
    fn check_version(&self, claimed: &str) {
        match (major_version(claimed), self.supported_major) {
            (Some(major), Some(supported)) if major != supported => {
                tracing::warn!(
                    claimed,
                    supported = %self.supported_version,
                    "protocol major version mismatch, processing anyway"
                );
            }
            (None, _) => {
                tracing::warn!(claimed, "unparseable protocol version, processing anyway");
            }
            _ => {}
        }
    }
}

fn decode<T: DeserializeOwned>(
    message_type: MessageType,
    map: Map<String, Value>,
) -> Result<T, ProtocolError> {
    serde_json::from_value(Value::Object(map))
        .map_err(|e| ProtocolError::Validation(format!("{message_type}: {e}")))
}

fn major_version(version: &str) -> Option<u32> {
    version.trim().split('.').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::WidgetAction;

    #[test]
    fn parses_widget_message() {
        let env = Parser::default()
            .parse_body(r#"{"type":"widget","widgetId":"hp","config":{"type":"stat","label":"HP"}}"#)
            .unwrap();
        let ProtocolMessage::Widget(widget) = env.message else {
            panic!("expected widget message");
        };
        assert_eq!(widget.id(), Some("hp"));
        assert_eq!(widget.action, WidgetAction::Create);
    }

    #[test]
    fn oversize_body_is_rejected_before_parsing() {
        let parser = Parser::new(16, SUPPORTED_VERSION);
        let err = parser.parse_body(r#"{"type":"ping","data":"xxxxxxxx"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::Oversize { limit: 16, .. }));
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = Parser::default().parse_body("{nope").unwrap_err();
        assert!(matches!(err, ProtocolError::Parse(_)));
    }

    #[test]
    fn non_object_missing_and_unknown_type_are_validation_errors() {
        let parser = Parser::default();
        for body in [
            "[1,2]",
            r#"{"widgetId":"x"}"#,
            r#"{"type":7}"#,
            r#"{"type":"launchMissiles"}"#,
        ] {
            assert!(
                matches!(parser.parse_body(body), Err(ProtocolError::Validation(_))),
                "{body}"
            );
        }
    }

    #[test]
    fn widget_without_any_id_is_rejected() {
        let err = Parser::default()
            .parse_body(r#"{"type":"widget","config":{"type":"stat"}}"#)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Validation(_)));
    }

    #[test]
    fn register_without_script_id_is_rejected() {
        let err = Parser::default()
            .parse_body(r#"{"type":"register","scriptName":"Quest"}"#)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::Validation(msg) if msg.starts_with("register")));
    }

    #[test]
    fn major_version_mismatch_still_processes() {
        let env = Parser::default()
            .parse_body(r#"{"type":"ping","v":"2.3","timestamp":5}"#)
            .unwrap();
        assert_eq!(env.version.as_deref(), Some("2.3"));
        assert!(matches!(env.message, ProtocolMessage::Ping(p) if p.timestamp == Some(5.0)));
    }

    #[test]
    fn bad_span_does_not_block_its_neighbours() {
        let text = r#"a [[BD:{oops:BD]] b [[BD:{"type":"clearAll"}:BD]] c"#;
        let parsed = Parser::default().parse_text(text);
        assert_eq!(parsed.len(), 2);
        assert!(matches!(parsed[0].outcome, Err(ProtocolError::Parse(_))));
        assert!(matches!(
            parsed[1].outcome.as_ref().map(|e| &e.message),
            Ok(ProtocolMessage::ClearAll)
        ));
        assert_eq!(parsed[1].fingerprint, fingerprint(r#"{"type":"clearAll"}"#));
    }

    #[test]
    fn major_version_parsing() {
        assert_eq!(major_version("1.0"), Some(1));
        assert_eq!(major_version("12"), Some(12));
        assert_eq!(major_version("x.1"), None);
    }
}
