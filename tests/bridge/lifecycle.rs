use bdbridge::bridge::{Bridge, PumpReport};
use bdbridge::config::Config;
use bdbridge::dom::{Page, Rect};
use bdbridge::events::event_bus;
use bdbridge::settings::MemorySettings;

use crate::support::{session, span, widget};

#[test]
fn teardown_releases_everything() {
    let mut s = session();
    s.append_output(&widget("hp", "create", r#"{"type":"bar","value":3,"max":10}"#))
        .unwrap();
    s.append_output(&span(r#"{"type":"ping"}"#)).unwrap();
    s.advance(10);
    s.page_mut().resize_window(900.0, 700.0);
    s.advance(10);
    assert!(s.bridge().active_timers() > 0);
    assert!(s.bridge().widgets().container().is_some());

    s.teardown();

    let page = s.page();
    assert_eq!(s.bridge().active_timers(), 0);
    assert_eq!(page.active_subscriptions(), 0);
    assert_eq!(page.document.active_observers(), 0);
    assert!(s.bridge().widgets().is_empty());
    assert!(page.document.find_by_class("bd-widget").is_none());
    assert!(page.document.get_element_by_id("bd-widget-bar").is_none());
    assert!(!s.bridge().is_running());
}

#[test]
fn nothing_fires_after_teardown() {
    let mut s = session();
    s.teardown();
    s.take_events();

    let raw = span(r#"{"type":"ping"}"#);
    s.append_output(&raw).unwrap();
    s.page_mut().resize_window(640.0, 480.0);
    s.page_mut().navigate("https://play.example/adventure/elsewhere");
    assert_eq!(s.advance(1_000), PumpReport::default());
    assert!(s.take_events().is_empty());
    assert_eq!(s.visible_text(), raw);
}

#[test]
fn teardown_is_idempotent_and_safe_before_start() {
    let (tx, _rx) = event_bus(8);
    let mut page = Page::new("https://play.example/");
    let mut bridge = Bridge::new(&Config::default(), Box::new(MemorySettings::new()), tx);
    bridge.teardown(&mut page);
    bridge.teardown(&mut page);
    assert_eq!(bridge.active_timers(), 0);

    let mut s = session();
    s.teardown();
    s.teardown();
    assert_eq!(s.page().active_subscriptions(), 0);
}

#[test]
fn resize_burst_repositions_bar_once_settled() {
    let mut s = session();
    s.append_output(&widget("a", "create", r#"{"type":"text","text":"hi"}"#))
        .unwrap();
    s.advance(10);
    let bar = s.bridge().widgets().container().unwrap();
    assert_eq!(s.page().document.style(bar, "width"), Some("960px"));

    let column = s.page().document.find_by_class("game-text-container").unwrap();
    s.page_mut().resize_window(1000.0, 800.0);
    s.page_mut()
        .resize_element(column, Rect::new(100.0, 64.0, 800.0, 700.0))
        .unwrap();
    s.advance(20);
    // debounced: nothing moves yet
    assert_eq!(s.page().document.style(bar, "width"), Some("960px"));

    s.advance(200);
    assert_eq!(s.page().document.style(bar, "left"), Some("100px"));
    assert_eq!(s.page().document.style(bar, "width"), Some("800px"));
}
