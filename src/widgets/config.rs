use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::WidgetError;
use crate::sanitize::is_safe_style_value;

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
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WidgetKind {
    Stat,
    Bar,
    Text,
    Panel,
    Custom,
    Badge,
    List,
    Icon,
    Counter,
}

/// Horizontal slot inside the widget bar.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Zone {
    Left,
    #[default]
    Center,
    Right,
}

impl Zone {
    pub const ALL: [Zone; 3] = [Zone::Left, Zone::Center, Zone::Right];
}

/// Widget ids are limited to ASCII letters, digits, `_` and `-`.
pub fn check_widget_id(id: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err("widget id must not be empty".into());
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(format!(
            "widget id {id:?} may only contain letters, digits, '_' and '-'"
        ));
    }
    Ok(())
}

/// A value shown verbatim: numbers print without a trailing `.0`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DisplayValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Fields every widget type accepts.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonConfig {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub order: Option<f64>,
    #[serde(default)]
    pub align: Zone,
    #[serde(default)]
    pub style: Option<Map<String, Value>>,
}

impl CommonConfig {
    /// `text` wins over `label` for widgets that show one string.
    pub fn caption(&self) -> Option<&str> {
        self.text.as_deref().or(self.label.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct StatConfig {
    #[serde(default)]
    pub value: Option<DisplayValue>,
    #[serde(default)]
    pub icon: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarConfig {
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default = "default_true")]
    pub show_value: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PanelItem {
    pub label: String,
    #[serde(default)]
    pub value: Option<DisplayValue>,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct PanelConfig {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub items: Vec<PanelItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CustomConfig {
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct BadgeConfig {
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub variant: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RichListItem {
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ListItem {
    Plain(String),
    Rich(RichListItem),
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ListConfig {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub items: Vec<ListItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IconConfig {
    pub icon: String,
    #[serde(default)]
    pub tooltip: Option<String>,
    #[serde(default)]
    pub size: Option<DisplayValue>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CounterConfig {
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub delta: Option<f64>,
}

/// Type-specific half of a widget config, one variant per [`WidgetKind`].
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetBody {
    Stat(StatConfig),
    Bar(BarConfig),
    Text,
    Panel(PanelConfig),
    Custom(CustomConfig),
    Badge(BadgeConfig),
    List(ListConfig),
    Icon(IconConfig),
    Counter(CounterConfig),
}

/// Validated widget configuration.
///
/// The raw JSON object is kept next to the typed view: updates merge onto
/// the raw object and the result is validated again as a whole, so a bad
/// partial update never leaves a half-applied config behind.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetConfig {
    kind: WidgetKind,
    pub common: CommonConfig,
    pub body: WidgetBody,
    raw: Map<String, Value>,
}

impl WidgetConfig {
    pub fn parse(id: &str, raw: Map<String, Value>) -> Result<Self, WidgetError> {
        let mut reasons = Vec::new();
        if let Err(reason) = check_widget_id(id) {
            reasons.push(reason);
        }

        let kind = match raw.get("type") {
            None | Some(Value::Null) => {
                reasons.push("config.type is required".into());
                None
            }
            Some(Value::String(name)) => match name.parse::<WidgetKind>() {
                Ok(kind) => Some(kind),
                Err(_) => {
                    reasons.push(format!("unknown widget type {name:?}"));
                    None
                }
            },
            Some(_) => {
                reasons.push("config.type must be a string".into());
                None
            }
        };
        let Some(kind) = kind else {
            return Err(invalid(id, reasons));
        };

        let value = Value::Object(raw.clone());
        let common = decode::<CommonConfig>(&value, &mut reasons);
        let body = decode_body(kind, &value, &mut reasons);
        let (Some(common), Some(body)) = (common, body) else {
            return Err(invalid(id, reasons));
        };
        check_colors(&common, &body, &mut reasons);
        if !reasons.is_empty() {
            return Err(invalid(id, reasons));
        }

        Ok(Self {
            kind,
            common,
            body,
            raw,
        })
    }

    /// Shallow-merge `partial` onto this config and validate the result.
    ///
    /// A partial that names a different `type` is rejected rather than merged
    /// across shapes.
    pub fn merge(&self, id: &str, partial: &Map<String, Value>) -> Result<Self, WidgetError> {
        if let Some(incoming) = partial.get("type").filter(|v| !v.is_null()) {
            let incoming = incoming
                .as_str()
                .map_or_else(|| incoming.to_string(), str::to_string);
            if incoming != self.kind.to_string() {
                return Err(WidgetError::TypeMismatch {
                    id: id.to_string(),
                    stored: self.kind.to_string(),
                    incoming,
                });
            }
        }
        let mut raw = self.raw.clone();
        for (key, value) in partial {
            raw.insert(key.clone(), value.clone());
        }
        Self::parse(id, raw)
    }

    pub fn kind(&self) -> WidgetKind {
        self.kind
    }

    pub fn zone(&self) -> Zone {
        self.common.align
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }
}

fn invalid(id: &str, reasons: Vec<String>) -> WidgetError {
    WidgetError::Validation {
        id: id.to_string(),
        reasons,
    }
}

fn decode<T: DeserializeOwned>(value: &Value, reasons: &mut Vec<String>) -> Option<T> {
    match T::deserialize(value) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            reasons.push(e.to_string());
            None
        }
    }
}

fn decode_body(kind: WidgetKind, value: &Value, reasons: &mut Vec<String>) -> Option<WidgetBody> {
    let body = match kind {
        WidgetKind::Stat => WidgetBody::Stat(decode(value, reasons)?),
        WidgetKind::Bar => {
            if !check_bar_fields(value, reasons) {
                return None;
            }
            let bar: BarConfig = decode(value, reasons)?;
            if let Some(max) = bar.max
                && !(max.is_finite() && max > 0.0)
            {
                reasons.push("bar max must be a positive number".into());
                return None;
            }
            WidgetBody::Bar(bar)
        }
        WidgetKind::Text => WidgetBody::Text,
        WidgetKind::Panel => WidgetBody::Panel(decode(value, reasons)?),
        WidgetKind::Custom => WidgetBody::Custom(decode(value, reasons)?),
        WidgetKind::Badge => {
            let badge: BadgeConfig = decode(value, reasons)?;
            if let Some(variant) = &badge.variant
                && !variant
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                reasons.push(format!("badge variant {variant:?} is not a valid name"));
                return None;
            }
            WidgetBody::Badge(badge)
        }
        WidgetKind::List => WidgetBody::List(decode(value, reasons)?),
        WidgetKind::Icon => WidgetBody::Icon(decode(value, reasons)?),
        WidgetKind::Counter => WidgetBody::Counter(decode(value, reasons)?),
    };
    Some(body)
}

/// `value` and `max` must be numbers (or absent) before the typed decode runs.
fn check_bar_fields(value: &Value, reasons: &mut Vec<String>) -> bool {
    let mut ok = true;
    for field in ["value", "max"] {
        match value.get(field) {
            None | Some(Value::Null | Value::Number(_)) => {}
            Some(_) => {
                reasons.push(format!("bar {field} must be numeric"));
                ok = false;
            }
        }
    }
    ok
}

/// Colors land in inline styles, so they go through the same value filter.
fn check_colors(common: &CommonConfig, body: &WidgetBody, reasons: &mut Vec<String>) {
    let mut colors: Vec<&str> = common.color.iter().map(String::as_str).collect();
    match body {
        WidgetBody::Panel(panel) => {
            colors.extend(panel.items.iter().filter_map(|i| i.color.as_deref()));
        }
        WidgetBody::List(list) => {
            colors.extend(list.items.iter().filter_map(|item| match item {
                ListItem::Rich(rich) => rich.color.as_deref(),
                ListItem::Plain(_) => None,
            }));
        }
        WidgetBody::Icon(IconConfig {
            size: Some(DisplayValue::Text(size)),
            ..
        }) if !is_safe_style_value(size) => {
            reasons.push(format!("icon size {size:?} is not an allowed CSS value"));
        }
        _ => {}
    }
    for color in colors {
        if !is_safe_style_value(color) {
            reasons.push(format!("color {color:?} is not an allowed CSS value"));
        }
    }
}
