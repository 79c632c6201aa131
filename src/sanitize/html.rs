use scraper::{ElementRef, Html, Node};

use super::css::sanitize_style_attr;
use super::policy::{
    BLOCKED_URL_SCHEMES, FORCED_LINK_REL, URL_ATTRIBUTES, is_allowed_attribute, is_allowed_tag,
    is_drop_with_content_tag,
};
use crate::utils::{escape_attr, escape_text};

const VOID_TAGS: &[&str] = &["br", "hr", "img", "col"];

/// Clean untrusted markup for injection into the live page.
///
/// The input is parsed into a detached fragment and re-serialized from an
/// allow-list walk:
/// - deny-listed tags (`script`, `style`, ...) vanish with their subtree;
/// - any other unknown tag is unwrapped, its safe descendants spliced into
///   the parent;
/// - attributes are filtered per tag, `on*` handlers always dropped, URL
///   schemes checked, and inline styles filtered;
/// - comments and doctypes are dropped.
///
/// Attributes come out sorted by name so the output is stable.
pub fn sanitize(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len());
    write_children(fragment.root_element(), &mut out);
    out
}

/// False for `javascript:`, `data:` and `vbscript:` URLs, however they are
/// spaced or cased.
pub fn is_safe_url(value: &str) -> bool {
    let compact: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    !BLOCKED_URL_SCHEMES
        .iter()
        .any(|scheme| compact.starts_with(scheme))
}

fn write_children(parent: ElementRef<'_>, out: &mut String) {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&escape_text(text)),
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(child) {
                    write_element(element, out);
                }
            }
            _ => {}
        }
    }
}

fn write_element(element: ElementRef<'_>, out: &mut String) {
    let tag = element.value().name();

    if is_drop_with_content_tag(tag) {
        tracing::debug!(tag, "dropping element with its content");
        return;
    }
    if !is_allowed_tag(tag) {
        tracing::debug!(tag, "unwrapping disallowed element");
        write_children(element, out);
        return;
    }

    out.push('<');
    out.push_str(tag);
    let mut has_target = false;
    let mut rel = None;
    let mut attrs: Vec<(&str, &str)> = element.value().attrs().collect();
    attrs.sort_unstable_by(|a, b| a.0.cmp(b.0));
    for (name, value) in attrs {
        let name = name.to_ascii_lowercase();
        if !is_allowed_attribute(tag, &name) {
            continue;
        }
        if URL_ATTRIBUTES.contains(&name.as_str()) && !is_safe_url(value) {
            tracing::debug!(tag, attribute = %name, "dropping unsafe URL");
            continue;
        }
        let value = if name == "style" {
            let filtered = sanitize_style_attr(value);
            if filtered.is_empty() {
                continue;
            }
            filtered
        } else {
            value.to_string()
        };
        if tag == "a" && name == "rel" {
            rel = Some(value);
            continue;
        }
        if tag == "a" && name == "target" {
            has_target = true;
        }
        out.push_str(&format!(" {name}=\"{}\"", escape_attr(&value)));
    }
    if has_target {
        out.push_str(&format!(" rel=\"{FORCED_LINK_REL}\""));
    } else if let Some(rel) = rel {
        out.push_str(&format!(" rel=\"{}\"", escape_attr(&rel)));
    }
    out.push('>');

    if VOID_TAGS.contains(&tag) {
        return;
    }
    write_children(element, out);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}
