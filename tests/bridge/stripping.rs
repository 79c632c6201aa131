use bdbridge::dom::Document;
use bdbridge::protocol::{PREFIX, strip_spans};
use bdbridge::settings::{MemorySettings, save_debug_mode};

use crate::support::{session, session_with, span};

#[test]
fn stripping_removes_every_prefix_whatever_the_body() {
    let bodies = [
        r#"{"type":"ping"}"#,
        "{not json",
        r#"{"type":"mystery"}"#,
        r#"{"type":"widget","widgetId":"x","config":{"type":"text","text":"a:BD]b"}}"#,
        "",
    ];
    let mut s = session();
    let text: String = bodies.iter().map(|b| format!("<{}>", span(b))).collect();
    s.append_output(&text).unwrap();
    s.advance(10);
    assert!(!s.visible_text().contains(PREFIX), "{}", s.visible_text());
}

#[test]
fn span_revealed_by_stripping_is_also_removed() {
    let (out, removed) = strip_spans("[[B[[BD:{}:BD]]D:{}:BD]]tail");
    assert!(!out.contains(PREFIX));
    assert_eq!(removed, 2);
    assert_eq!(out, "tail");
}

#[test]
fn stripping_does_not_retrigger_processing() {
    let mut s = session();
    s.append_output(&span(r#"{"type":"ping"}"#)).unwrap();
    s.advance(10);
    s.take_events();

    // the strip rewrote the text node; nothing new should be seen
    let report = s.advance(10);
    assert_eq!(report.spans, 0);
    assert!(s.take_events().is_empty());
    assert!(s.bridge().is_observing());
}

#[test]
fn later_edits_to_the_same_node_are_processed() {
    let mut s = session();
    let node = s.append_output("The door ").unwrap();
    s.advance(10);
    s.page_mut()
        .document
        .set_text(node, &format!("The door {} opens.", span(r#"{"type":"clearAll"}"#)))
        .unwrap();
    let report = s.advance(10);
    assert_eq!(report.dispatched, 1);
    assert_eq!(s.visible_text(), "The door  opens.");
}

#[test]
fn debug_mode_keeps_protocol_text_visible_but_still_dispatches() {
    let mut store = MemorySettings::new();
    save_debug_mode(&mut store, true).unwrap();
    let mut s = session_with(store);
    let raw = span(r#"{"type":"widget","widgetId":"hp","config":{"type":"text","text":"x"}}"#);
    s.append_output(&raw).unwrap();
    let report = s.advance(10);

    assert_eq!(report.dispatched, 1);
    assert_eq!(report.stripped, 0);
    assert_eq!(s.visible_text(), raw);
    assert!(s.bridge().widgets().get("hp").is_some());
}

#[test]
fn turning_debug_mode_off_resumes_stripping() {
    let mut store = MemorySettings::new();
    save_debug_mode(&mut store, true).unwrap();
    let mut s = session_with(store);
    s.bridge_mut().set_debug_mode(false).unwrap();
    s.append_output(&span(r#"{"type":"ping"}"#)).unwrap();
    s.advance(10);
    assert_eq!(s.visible_text(), "");
}

#[test]
fn reentrant_strip_is_refused_and_observation_survives() {
    use bdbridge::bridge::{ObservationDriver, StripGuard};
    use std::cell::Cell;

    let mut doc = Document::new();
    let output = doc.create_element("div");
    doc.set_attr(output, "id", "gameplay-output").unwrap();
    let body = doc.body();
    doc.append_child(body, output).unwrap();
    let node = doc.create_text(&span(r#"{"type":"ping"}"#));
    doc.append_child(output, node).unwrap();

    let mut driver = ObservationDriver::new("gameplay-output");
    driver.attach(&mut doc);
    let flag = Cell::new(false);
    {
        let mut outer = StripGuard::acquire(&mut doc, &flag, driver.observers()).unwrap();
        // a nested mutation notification trying to strip again
        assert!(StripGuard::acquire(&mut outer, &flag, driver.observers()).is_none());
        outer.set_text(node, "").unwrap();
    }
    assert!(!flag.get());
    assert_eq!(doc.active_observers(), 1);
    assert!(!doc.has_pending_records());

    // the driver's own guard still works afterwards
    doc.set_text(node, &span(r#"{"type":"ping"}"#)).unwrap();
    assert_eq!(driver.take_changed_text(&mut doc), vec![node]);
    assert_eq!(driver.strip(&mut doc, node).unwrap(), 1);
    assert!(!driver.is_stripping());
}
