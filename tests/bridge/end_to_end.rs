use bdbridge::events::{BridgeEvent, WidgetEventAction};
use bdbridge::widgets::WidgetKind;

use crate::support::{bar_text, session};

const STORY: &str = r#"Some story. [[BD:{"type":"widget","widgetId":"hp","config":{"type":"stat","label":"HP","value":"50/100"}}:BD]] More story."#;

#[test]
fn story_is_cleaned_and_stat_widget_rendered() {
    let mut s = session();
    s.append_output(STORY).unwrap();
    let report = s.advance(16);

    assert_eq!(report.dispatched, 1);
    assert_eq!(s.visible_text(), "Some story.  More story.");
    assert!(!s.visible_text().contains("[[BD:"));

    let widgets = s.bridge().widgets();
    assert_eq!(widgets.len(), 1);
    assert_eq!(widgets.get("hp").unwrap().kind(), WidgetKind::Stat);
    assert_eq!(bar_text(&s, "bd-stat-label").as_deref(), Some("HP"));
    assert_eq!(bar_text(&s, "bd-stat-value").as_deref(), Some("50/100"));

    assert_eq!(
        s.take_events(),
        vec![BridgeEvent::Widget {
            action: WidgetEventAction::Created,
            widget_id: "hp".into(),
            widget_type: Some(WidgetKind::Stat),
        }]
    );
}

#[test]
fn widget_bar_sits_outside_the_story_output() {
    let mut s = session();
    s.append_output(STORY).unwrap();
    s.advance(16);
    let doc = &s.page().document;
    let bar = s.bridge().widgets().container().unwrap();
    assert!(!doc.is_inclusive_descendant(bar, s.output()));
    assert_eq!(doc.attr(bar, "id"), Some("bd-widget-bar"));
    // placed under the story column
    assert_eq!(doc.style(bar, "left"), Some("160px"));
    assert_eq!(doc.style(bar, "width"), Some("960px"));
}

#[test]
fn several_messages_in_one_chunk_all_dispatch() {
    let mut s = session();
    s.append_output(concat!(
        r#"[[BD:{"type":"register","scriptId":"tracker","scriptName":"Tracker"}:BD]]"#,
        "You enter the keep.",
        r#"[[BD:{"type":"widget","widgetId":"gold","config":{"type":"counter","label":"Gold","value":12,"delta":3}}:BD]]"#,
        r#"[[BD:{"type":"ping","data":"hi","timestamp":5}:BD]]"#,
    ))
    .unwrap();
    let report = s.advance(16);
    assert_eq!(report.spans, 3);
    assert_eq!(report.dispatched, 3);
    assert_eq!(s.visible_text(), "You enter the keep.");

    let names: Vec<&str> = s.take_events().iter().map(BridgeEvent::name).collect();
    assert_eq!(names, vec!["registered", "widget", "pong"]);
    assert_eq!(s.bridge().registered_scripts().len(), 1);
    assert_eq!(bar_text(&s, "bd-counter-delta").as_deref(), Some("+3"));
}

#[test]
fn malformed_span_is_stripped_while_neighbours_dispatch() {
    let mut s = session();
    s.append_output(concat!(
        "A ",
        r#"[[BD:{"type":"widget","widgetId":"a","config":{"type":"text","text":"ok"}}:BD]]"#,
        " B ",
        "[[BD:{broken json:BD]]",
        " C",
    ))
    .unwrap();
    let report = s.advance(16);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.dispatched, 1);
    assert_eq!(s.visible_text(), "A  B  C");
    assert_eq!(bar_text(&s, "bd-text-content").as_deref(), Some("ok"));
}

#[test]
fn oversize_message_is_skipped_but_stripped() {
    let mut s = session();
    let big = "x".repeat(20_000);
    s.append_output(&format!(
        r#"before [[BD:{{"type":"ping","data":"{big}"}}:BD]] after"#
    ))
    .unwrap();
    let report = s.advance(16);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.dispatched, 0);
    assert_eq!(s.visible_text(), "before  after");
    assert!(s.take_events().is_empty());
}
