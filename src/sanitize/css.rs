use serde_json::{Map, Value};

use super::policy::{
    BLOCKED_STYLE_VALUE_CHARS, BLOCKED_STYLE_VALUE_PATTERNS, is_allowed_style_property,
};
use crate::utils::camel_to_kebab;

/// False when the value contains a blocked pattern, a declaration or
/// attribute delimiter, or a CSS escape (an escape can spell any blocked
/// pattern).
pub fn is_safe_style_value(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    !lower.contains(BLOCKED_STYLE_VALUE_CHARS)
        && !BLOCKED_STYLE_VALUE_PATTERNS
            .iter()
            .any(|pattern| lower.contains(pattern))
}

/// Filter one declaration; returns the normalized `(property, value)` to keep.
fn filter_declaration(prop: &str, value: &str) -> Option<(String, String)> {
    let prop = prop.trim().to_ascii_lowercase();
    let value = value.trim();
    if prop.is_empty() || value.is_empty() {
        return None;
    }
    if !is_allowed_style_property(&prop) {
        tracing::debug!(property = %prop, "dropping disallowed style property");
        return None;
    }
    if !is_safe_style_value(value) {
        tracing::debug!(property = %prop, "dropping unsafe style value");
        return None;
    }
    Some((prop, value.to_string()))
}

/// Filter an inline `style` attribute. Returns an empty string when nothing survives.
pub fn sanitize_style_attr(style: &str) -> String {
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            filter_declaration(prop, value)
        })
        .map(|(prop, value)| format!("{prop}: {value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Filter a script-supplied style object (`{"fontSize": "12px"}`) into
/// kebab-case declarations. Non-scalar values are dropped.
pub fn sanitize_style_object(style: &Map<String, Value>) -> Vec<(String, String)> {
    style
        .iter()
        .filter_map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            filter_declaration(&camel_to_kebab(key), &value)
        })
        .collect()
}
