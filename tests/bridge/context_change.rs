use bdbridge::events::BridgeEvent;

use crate::support::{session, span, widget};

const REGISTER: &str = r#"{"type":"register","scriptId":"tracker"}"#;

#[test]
fn new_adventure_clears_widgets_scripts_and_dedup() {
    let mut s = session();
    s.append_output(&span(REGISTER)).unwrap();
    s.append_output(&widget("hp", "create", r#"{"type":"text","text":"x"}"#))
        .unwrap();
    s.advance(10);
    assert_eq!(s.bridge().registered_scripts().len(), 1);
    s.take_events();

    s.navigate("https://play.example/adventure/other");
    let report = s.advance(10);
    assert!(report.context_changed);
    assert_eq!(s.bridge().adventure(), Some("other"));
    assert!(s.bridge().widgets().is_empty());
    assert!(s.bridge().registered_scripts().is_empty());
    assert_eq!(s.bridge().dedup_entries(), 0);
    assert_eq!(s.take_events(), vec![BridgeEvent::Cleared { widgets: 1 }]);

    // inside the old dedup window, but the cache was reset
    s.append_output(&span(REGISTER)).unwrap();
    assert_eq!(s.advance(10).dispatched, 1);
}

#[test]
fn navigation_within_adventure_keeps_state() {
    let mut s = session();
    s.append_output(&widget("hp", "create", r#"{"type":"text","text":"x"}"#))
        .unwrap();
    s.advance(10);
    s.navigate("https://play.example/adventure/keep/chapter/2");
    let report = s.advance(10);
    assert!(!report.context_changed);
    assert_eq!(s.bridge().widgets().len(), 1);
}

#[test]
fn replaced_output_container_is_picked_up() {
    let mut s = session();
    let old = s.output();
    let column = s.page().document.parent(old).unwrap();
    {
        let doc = &mut s.page_mut().document;
        doc.remove(old).unwrap();
        let fresh = doc.create_element("div");
        doc.set_attr(fresh, "id", "gameplay-output").unwrap();
        let text = doc.create_text(&format!("Recap. {}", span(r#"{"type":"ping"}"#)));
        doc.append_child(fresh, text).unwrap();
        doc.append_child(column, fresh).unwrap();
    }
    // the swap is a page mutation; the context re-check runs after the debounce
    s.advance(10);
    let report = s.advance(200);
    assert_eq!(report.dispatched, 1);
    assert!(!report.context_changed);
    assert!(s.bridge().is_observing());

    let doc = &s.page().document;
    let fresh = doc.get_element_by_id("gameplay-output").unwrap();
    assert_eq!(doc.text_content(fresh), "Recap. ");
    assert_eq!(s.take_events()[0].name(), "pong");
}
