use crate::support::{session, span};

const PING: &str = r#"{"type":"ping","data":"again"}"#;

fn pongs(events: &[bdbridge::BridgeEvent]) -> usize {
    events.iter().filter(|e| e.name() == "pong").count()
}

#[test]
fn repeat_inside_window_is_handled_once() {
    let mut s = session();
    s.append_output(&span(PING)).unwrap();
    let first = s.advance(10);
    s.append_output(&span(PING)).unwrap();
    let second = s.advance(200);

    assert_eq!(first.dispatched, 1);
    assert_eq!(second.dispatched, 0);
    assert_eq!(second.suppressed, 1);
    assert_eq!(second.stripped, 1);
    assert_eq!(pongs(&s.take_events()), 1);
    assert_eq!(s.visible_text(), "");
}

#[test]
fn repeat_after_window_is_handled_again() {
    let mut s = session();
    s.append_output(&span(PING)).unwrap();
    s.advance(10);
    s.append_output(&span(PING)).unwrap();
    s.advance(600);
    assert_eq!(pongs(&s.take_events()), 2);
}

#[test]
fn identical_spans_in_one_chunk_collapse() {
    let mut s = session();
    s.append_output(&format!("{} and {}", span(PING), span(PING))).unwrap();
    let report = s.advance(10);
    assert_eq!(report.spans, 2);
    assert_eq!(report.dispatched, 1);
    assert_eq!(report.suppressed, 1);
    assert_eq!(s.visible_text(), " and ");
}

#[test]
fn different_bodies_are_not_deduplicated() {
    let mut s = session();
    s.append_output(&span(r#"{"type":"ping","data":1}"#)).unwrap();
    s.append_output(&span(r#"{"type":"ping","data":2}"#)).unwrap();
    assert_eq!(s.advance(10).dispatched, 2);
}

#[test]
fn cache_empties_and_sweep_stops_when_idle() {
    let mut s = session();
    s.append_output(&span(PING)).unwrap();
    s.advance(10);
    assert_eq!(s.bridge().dedup_entries(), 1);
    s.settle();
    assert_eq!(s.bridge().dedup_entries(), 0);
    assert_eq!(s.bridge().active_timers(), 0);
}
