#![allow(dead_code)]

use bdbridge::config::Config;
use bdbridge::host::HostSession;
use bdbridge::settings::MemorySettings;

pub const URL: &str = "https://play.example/adventure/keep";

pub fn session() -> HostSession {
    session_with(MemorySettings::new())
}

pub fn session_with(settings: MemorySettings) -> HostSession {
    HostSession::new(&Config::default(), Box::new(settings), URL).expect("session should build")
}

pub fn span(body: &str) -> String {
    format!("[[BD:{body}:BD]]")
}

pub fn widget(id: &str, action: &str, config: &str) -> String {
    span(&format!(
        r#"{{"type":"widget","widgetId":"{id}","action":"{action}","config":{config}}}"#
    ))
}

/// Text of the first element with `class` inside the widget bar.
pub fn bar_text(session: &HostSession, class: &str) -> Option<String> {
    let doc = &session.page().document;
    let bar = session.bridge().widgets().container()?;
    doc.find_all_by_class(bar, class)
        .first()
        .map(|node| doc.text_content(*node))
}

pub fn bar_style(session: &HostSession, class: &str, prop: &str) -> Option<String> {
    let doc = &session.page().document;
    let bar = session.bridge().widgets().container()?;
    let node = *doc.find_all_by_class(bar, class).first()?;
    doc.style(node, prop).map(str::to_string)
}
