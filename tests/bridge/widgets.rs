use bdbridge::events::{BridgeEvent, ErrorKind, WidgetEventAction};
use bdbridge::widgets::{WidgetKind, Zone};

use crate::support::{bar_style, bar_text, session, span, widget};

fn errors(events: &[BridgeEvent]) -> Vec<&BridgeEvent> {
    events
        .iter()
        .filter(|e| matches!(e, BridgeEvent::Error { .. }))
        .collect()
}

#[test]
fn bar_fill_tracks_value_and_clamps() {
    let mut s = session();
    s.append_output(&widget("hp", "create", r#"{"type":"bar","value":50,"max":100}"#))
        .unwrap();
    s.advance(10);
    assert_eq!(bar_style(&s, "bd-bar-fill", "width").as_deref(), Some("50%"));

    s.append_output(&widget("hp", "update", r#"{"value":200}"#)).unwrap();
    s.advance(10);
    assert_eq!(bar_style(&s, "bd-bar-fill", "width").as_deref(), Some("100%"));
    assert_eq!(bar_text(&s, "bd-bar-value").as_deref(), Some("200/100"));
}

#[test]
fn unknown_type_creates_nothing_and_reports_once() {
    let mut s = session();
    s.append_output(&widget("x", "create", r#"{"type":"not-a-type"}"#))
        .unwrap();
    s.advance(10);

    assert!(s.bridge().widgets().get("x").is_none());
    assert!(s.page().document.find_by_class("bd-widget").is_none());
    let events = s.take_events();
    assert_eq!(events.len(), 1);
    match &events[0] {
        BridgeEvent::Error {
            kind,
            widget_id,
            reasons,
            ..
        } => {
            assert_eq!(*kind, ErrorKind::ValidationError);
            assert_eq!(widget_id.as_deref(), Some("x"));
            assert!(!reasons.is_empty());
        }
        other => panic!("expected an error event, got {other:?}"),
    }
}

#[test]
fn partial_update_keeps_other_fields() {
    let mut s = session();
    s.append_output(&widget(
        "gold",
        "create",
        r#"{"type":"stat","label":"Gold","value":10,"icon":"$"}"#,
    ))
    .unwrap();
    s.advance(10);
    let element = s.bridge().widgets().get("gold").unwrap().element();

    s.append_output(&widget("gold", "update", r#"{"value":15}"#)).unwrap();
    s.advance(10);
    assert_eq!(s.bridge().widgets().get("gold").unwrap().element(), element);
    assert_eq!(bar_text(&s, "bd-stat-label").as_deref(), Some("Gold"));
    assert_eq!(bar_text(&s, "bd-stat-value").as_deref(), Some("15"));
    assert_eq!(bar_text(&s, "bd-stat-icon").as_deref(), Some("$"));
}

#[test]
fn update_of_missing_widget_creates_it() {
    let mut s = session();
    s.append_output(&widget("note", "update", r#"{"type":"text","text":"hello"}"#))
        .unwrap();
    s.advance(10);
    assert_eq!(
        s.take_events(),
        vec![BridgeEvent::Widget {
            action: WidgetEventAction::Created,
            widget_id: "note".into(),
            widget_type: Some(WidgetKind::Text),
        }]
    );
}

#[test]
fn cross_type_update_is_rejected() {
    let mut s = session();
    s.append_output(&widget("hp", "create", r#"{"type":"bar","value":5}"#))
        .unwrap();
    s.advance(10);
    s.take_events();

    s.append_output(&widget("hp", "update", r#"{"type":"text","text":"nope"}"#))
        .unwrap();
    s.advance(10);
    let events = s.take_events();
    assert_eq!(errors(&events).len(), 1);
    assert_eq!(s.bridge().widgets().get("hp").unwrap().kind(), WidgetKind::Bar);
}

#[test]
fn create_with_new_type_replaces_widget() {
    let mut s = session();
    s.append_output(&widget("slot", "create", r#"{"type":"bar","value":5}"#))
        .unwrap();
    s.advance(10);
    s.append_output(&widget("slot", "create", r#"{"type":"badge","text":"Poisoned","variant":"danger"}"#))
        .unwrap();
    s.advance(10);

    let doc = &s.page().document;
    assert_eq!(doc.find_all_by_class(doc.body(), "bd-widget").len(), 1);
    assert_eq!(s.bridge().widgets().get("slot").unwrap().kind(), WidgetKind::Badge);
    assert!(doc.find_by_class("bd-badge-danger").is_some());
    assert!(doc.find_by_class("bd-widget-bar").is_some());
}

#[test]
fn destroying_last_widget_removes_bar() {
    let mut s = session();
    s.append_output(&widget("a", "create", r#"{"type":"text","text":"one"}"#))
        .unwrap();
    s.advance(10);
    s.append_output(&span(r#"{"type":"widget","widgetId":"a","action":"destroy"}"#))
        .unwrap();
    s.advance(10);
    assert!(s.bridge().widgets().container().is_none());
    assert!(s.page().document.get_element_by_id("bd-widget-bar").is_none());
    let last = s.take_events().pop().unwrap();
    assert!(matches!(
        last,
        BridgeEvent::Widget {
            action: WidgetEventAction::Destroyed,
            ..
        }
    ));
}

#[test]
fn alignment_picks_zone_and_order_sets_flex_order() {
    let mut s = session();
    s.append_output(&widget("r", "create", r#"{"type":"text","text":"right","align":"right","order":2}"#))
        .unwrap();
    s.append_output(&widget("c", "create", r#"{"type":"text","text":"centre"}"#))
        .unwrap();
    s.advance(10);

    let widgets = s.bridge().widgets();
    let doc = &s.page().document;
    let right = widgets.get("r").unwrap().element();
    let centre = widgets.get("c").unwrap().element();
    assert_eq!(doc.parent(right), widgets.zone_container(Zone::Right));
    assert_eq!(doc.parent(centre), widgets.zone_container(Zone::Center));
    assert_eq!(doc.style(right, "order"), Some("2"));
}

#[test]
fn custom_markup_is_sanitized() {
    let mut s = session();
    s.append_output(&widget(
        "c",
        "create",
        r#"{"type":"custom","html":"<script>alert(1)</script><b onclick=\"x()\">ok</b><a href=\"javascript:evil()\">x</a>"}"#,
    ))
    .unwrap();
    s.advance(10);
    let html = s.widget_bar_html().unwrap();
    assert!(html.contains("<b>ok</b>"), "{html}");
    assert!(!html.contains("script"), "{html}");
    assert!(!html.contains("javascript"), "{html}");
    assert!(!html.contains("onclick"), "{html}");
}

#[test]
fn clear_all_message_removes_everything() {
    let mut s = session();
    s.append_output(&widget("a", "create", r#"{"type":"text","text":"1"}"#))
        .unwrap();
    s.append_output(&widget("b", "create", r#"{"type":"text","text":"2"}"#))
        .unwrap();
    s.advance(10);
    s.take_events();

    s.append_output(&span(r#"{"type":"clearAll"}"#)).unwrap();
    s.advance(10);
    assert!(s.bridge().widgets().is_empty());
    assert_eq!(s.take_events(), vec![BridgeEvent::Cleared { widgets: 2 }]);
}

#[test]
fn create_without_config_is_a_validation_error() {
    let mut s = session();
    s.append_output(&span(r#"{"type":"widget","widgetId":"hp"}"#)).unwrap();
    s.advance(10);
    let events = s.take_events();
    assert_eq!(errors(&events).len(), 1);
    assert!(s.bridge().widgets().is_empty());
}
