use super::config::{
    BadgeConfig, BarConfig, CommonConfig, CounterConfig, DisplayValue, IconConfig, ListConfig,
    ListItem, PanelConfig, StatConfig, WidgetBody, WidgetConfig,
};
use super::view::{VElement, VNode, el};
use crate::sanitize::{sanitize, sanitize_style_object};

pub const DEFAULT_BAR_MAX: f64 = 100.0;

/// `clamp(0, 100, value / max * 100)`; a missing value counts as 0 and a
/// missing max as 100.
pub fn bar_percent(value: Option<f64>, max: Option<f64>) -> f64 {
    let value = value.unwrap_or(0.0);
    let max = max.unwrap_or(DEFAULT_BAR_MAX);
    let pct = value / max * 100.0;
    if pct.is_nan() { 0.0 } else { pct.clamp(0.0, 100.0) }
}

/// `50.0` -> `"50%"`, `33.333` -> `"33.33%"`.
pub fn format_percent(pct: f64) -> String {
    let rounded = (pct * 100.0).round() / 100.0;
    format!("{rounded}%")
}

/// Render a widget's element tree from its config.
pub fn render(id: &str, config: &WidgetConfig) -> VNode {
    let common = &config.common;
    let mut class = format!("bd-widget bd-widget-{}", config.kind());
    if let WidgetBody::Badge(badge) = &config.body {
        class.push_str(&format!(
            " bd-badge-{}",
            badge.variant.as_deref().unwrap_or("default")
        ));
    }

    let mut root = el("div").class(class).attr("data-widget-id", id);
    if let Some(order) = common.order.filter(|o| o.is_finite()) {
        root = root.style("order", format!("{}", order.round() as i64));
    }
    if !matches!(config.body, WidgetBody::Bar(_)) {
        root = root.style_opt("color", common.color.clone());
    }
    if let Some(style) = &common.style {
        root = root.styles(sanitize_style_object(style));
    }

    let root = match &config.body {
        WidgetBody::Stat(stat) => render_stat(root, common, stat),
        WidgetBody::Bar(bar) => render_bar(root, common, bar),
        WidgetBody::Text => root.child(
            el("span")
                .class("bd-text-content")
                .text(common.caption().unwrap_or_default()),
        ),
        WidgetBody::Panel(panel) => render_panel(root, panel),
        WidgetBody::Custom(custom) => root.child(
            el("div")
                .class("bd-custom-content")
                .child(VNode::Html(sanitize(&custom.html))),
        ),
        WidgetBody::Badge(badge) => render_badge(root, common, badge),
        WidgetBody::List(list) => render_list(root, list),
        WidgetBody::Icon(icon) => render_icon(root, icon),
        WidgetBody::Counter(counter) => render_counter(root, common, counter),
    };
    root.into()
}

fn label(common: &CommonConfig, class: &str) -> Option<VNode> {
    common
        .label
        .as_ref()
        .map(|label| el("span").class(class).text(label.as_str()).into())
}

fn render_stat(root: VElement, common: &CommonConfig, stat: &StatConfig) -> VElement {
    let icon: Option<VNode> = stat
        .icon
        .as_ref()
        .map(|icon| el("span").class("bd-stat-icon").text(icon.as_str()).into());
    let value = stat.value.as_ref().map(ToString::to_string).unwrap_or_default();
    root.children(icon)
        .children(label(common, "bd-stat-label"))
        .child(el("span").class("bd-stat-value").text(value))
}

fn render_bar(root: VElement, common: &CommonConfig, bar: &BarConfig) -> VElement {
    let pct = bar_percent(bar.value, bar.max);
    let fill = el("div")
        .class("bd-bar-fill")
        .style("width", format_percent(pct))
        .style_opt("background-color", common.color.clone());
    let readout: Option<VNode> = bar.show_value.then(|| {
        let value = bar.value.unwrap_or(0.0);
        let max = bar.max.unwrap_or(DEFAULT_BAR_MAX);
        el("span")
            .class("bd-bar-value")
            .text(format!("{value}/{max}"))
            .into()
    });
    root.children(label(common, "bd-bar-label"))
        .child(el("div").class("bd-bar-track").child(fill))
        .children(readout)
}

fn render_panel(root: VElement, panel: &PanelConfig) -> VElement {
    let title: Option<VNode> = panel
        .title
        .as_ref()
        .map(|t| el("div").class("bd-panel-title").text(t.as_str()).into());
    let items = panel.items.iter().map(|item| -> VNode {
        el("div")
            .class("bd-panel-item")
            .style_opt("color", item.color.clone())
            .child(el("span").class("bd-panel-label").text(item.label.as_str()))
            .child(
                el("span")
                    .class("bd-panel-value")
                    .text(item.value.as_ref().map(ToString::to_string).unwrap_or_default()),
            )
            .into()
    });
    root.children(title)
        .child(el("div").class("bd-panel-items").children(items))
}

fn render_badge(root: VElement, common: &CommonConfig, badge: &BadgeConfig) -> VElement {
    let icon: Option<VNode> = badge
        .icon
        .as_ref()
        .map(|icon| el("span").class("bd-badge-icon").text(icon.as_str()).into());
    root.children(icon).child(
        el("span")
            .class("bd-badge-text")
            .text(common.caption().unwrap_or_default()),
    )
}

fn render_list(root: VElement, list: &ListConfig) -> VElement {
    let title: Option<VNode> = list
        .title
        .as_ref()
        .map(|t| el("div").class("bd-list-title").text(t.as_str()).into());
    let items = list.items.iter().map(|item| -> VNode {
        match item {
            ListItem::Plain(text) => el("li")
                .class("bd-list-item")
                .child(el("span").class("bd-list-text").text(text.as_str()))
                .into(),
            ListItem::Rich(rich) => el("li")
                .class("bd-list-item")
                .style_opt("color", rich.color.clone())
                .children(
                    rich.icon
                        .as_ref()
                        .map(|icon| VNode::from(el("span").class("bd-list-icon").text(icon.as_str()))),
                )
                .child(el("span").class("bd-list-text").text(rich.text.as_str()))
                .into(),
        }
    });
    root.children(title)
        .child(el("ul").class("bd-list-items").children(items))
}

fn render_icon(root: VElement, icon: &IconConfig) -> VElement {
    let size = icon.size.as_ref().map(|size| match size {
        DisplayValue::Number(px) => format!("{px}px"),
        DisplayValue::Text(css) => css.clone(),
    });
    root.attr_opt("title", icon.tooltip.clone()).child(
        el("span")
            .class("bd-icon-glyph")
            .style_opt("font-size", size)
            .text(icon.icon.as_str()),
    )
}

fn render_counter(root: VElement, common: &CommonConfig, counter: &CounterConfig) -> VElement {
    let delta: Option<VNode> = counter.delta.filter(|d| *d != 0.0 && d.is_finite()).map(|d| {
        let (class, text) = if d > 0.0 {
            ("bd-counter-delta bd-counter-delta-up", format!("+{d}"))
        } else {
            ("bd-counter-delta bd-counter-delta-down", format!("{d}"))
        };
        el("span").class(class).text(text).into()
    });
    root.children(label(common, "bd-counter-label"))
        .child(
            el("span")
                .class("bd-counter-value")
                .text(format!("{}", counter.value.unwrap_or(0.0))),
        )
        .children(delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use crate::widgets::view::build;
    use serde_json::{Value, json};

    fn config(value: Value) -> WidgetConfig {
        WidgetConfig::parse("w", value.as_object().cloned().unwrap()).unwrap()
    }

    fn html(value: Value) -> String {
        let mut doc = Document::new();
        let node = build(&mut doc, &render("w", &config(value))).unwrap();
        doc.outer_html(node)
    }

    #[test]
    fn percent_is_clamped() {
        assert_eq!(bar_percent(Some(50.0), Some(100.0)), 50.0);
        assert_eq!(bar_percent(Some(200.0), Some(100.0)), 100.0);
        assert_eq!(bar_percent(Some(-5.0), None), 0.0);
        assert_eq!(bar_percent(None, None), 0.0);
        assert_eq!(bar_percent(Some(30.0), None), 30.0);
    }

    #[test]
    fn percent_formatting() {
        assert_eq!(format_percent(50.0), "50%");
        assert_eq!(format_percent(100.0 / 3.0), "33.33%");
    }

    #[test]
    fn stat_shows_label_and_value() {
        assert_eq!(
            html(json!({"type": "stat", "label": "HP", "value": "50/100"})),
            concat!(
                r#"<div class="bd-widget bd-widget-stat" data-widget-id="w">"#,
                r#"<span class="bd-stat-label">HP</span>"#,
                r#"<span class="bd-stat-value">50/100</span></div>"#
            )
        );
    }

    #[test]
    fn bar_renders_fill_and_readout() {
        let out = html(json!({"type": "bar", "label": "HP", "value": 50, "max": 100, "color": "#c33"}));
        assert!(out.contains(r#"<div class="bd-bar-fill" style="width: 50%; background-color: #c33">"#), "{out}");
        assert!(out.contains(r#"<span class="bd-bar-value">50/100</span>"#), "{out}");
    }

    #[test]
    fn bar_readout_can_be_hidden() {
        let out = html(json!({"type": "bar", "value": 1, "showValue": false}));
        assert!(!out.contains("bd-bar-value"));
    }

    #[test]
    fn text_is_escaped() {
        let out = html(json!({"type": "text", "text": "<b>bold?</b>"}));
        assert!(out.contains("&lt;b&gt;bold?&lt;/b&gt;"));
    }

    #[test]
    fn custom_html_is_sanitized() {
        let out = html(json!({"type": "custom", "html": "<b onclick=\"x()\">ok</b><script>bad()</script>"}));
        assert!(out.contains(r#"<div class="bd-custom-content"><b>ok</b></div>"#), "{out}");
        assert!(!out.contains("bad()"));
    }

    #[test]
    fn order_and_style_object_land_on_root() {
        let out = html(json!({
            "type": "text",
            "text": "t",
            "order": 2,
            "style": {"fontWeight": "bold", "position": "fixed"}
        }));
        assert!(out.contains(r#"style="order: 2; font-weight: bold""#), "{out}");
    }

    #[test]
    fn badge_carries_variant_class() {
        let out = html(json!({"type": "badge", "text": "Poisoned", "variant": "danger", "icon": "☠"}));
        assert!(out.starts_with(r#"<div class="bd-widget bd-widget-badge bd-badge-danger""#));
        assert!(out.contains(r#"<span class="bd-badge-icon">☠</span><span class="bd-badge-text">Poisoned</span>"#));
    }

    #[test]
    fn list_renders_plain_and_rich_items() {
        let out = html(json!({
            "type": "list",
            "title": "Inventory",
            "items": ["Rope", {"icon": "🗡", "text": "Dagger", "color": "gold"}]
        }));
        assert!(out.contains(r#"<div class="bd-list-title">Inventory</div>"#));
        assert!(out.contains(r#"<li class="bd-list-item"><span class="bd-list-text">Rope</span></li>"#));
        assert!(out.contains(
            r#"<li class="bd-list-item" style="color: gold"><span class="bd-list-icon">🗡</span><span class="bd-list-text">Dagger</span></li>"#
        ));
    }

    #[test]
    fn panel_lists_label_value_pairs() {
        let out = html(json!({
            "type": "panel",
            "title": "Stats",
            "items": [{"label": "STR", "value": 12}, {"label": "Class", "value": "Rogue"}]
        }));
        assert!(out.contains(r#"<span class="bd-panel-label">STR</span><span class="bd-panel-value">12</span>"#));
        assert!(out.contains(r#"<span class="bd-panel-value">Rogue</span>"#));
    }

    #[test]
    fn icon_size_and_tooltip() {
        let out = html(json!({"type": "icon", "icon": "🔥", "tooltip": "Burning", "size": 20}));
        assert!(out.contains(r#"title="Burning""#));
        assert!(out.contains(r#"<span class="bd-icon-glyph" style="font-size: 20px">🔥</span>"#));
    }

    #[test]
    fn counter_delta_is_signed() {
        let up = html(json!({"type": "counter", "label": "Gold", "value": 15, "delta": 5}));
        assert!(up.contains(r#"<span class="bd-counter-delta bd-counter-delta-up">+5</span>"#), "{up}");
        let down = html(json!({"type": "counter", "value": 10, "delta": -3}));
        assert!(down.contains(r#"<span class="bd-counter-delta bd-counter-delta-down">-3</span>"#));
        let none = html(json!({"type": "counter", "delta": 0}));
        assert!(!none.contains("bd-counter-delta"));
        assert!(none.contains(r#"<span class="bd-counter-value">0</span>"#));
    }
}
