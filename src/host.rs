//! A simulated host page driven on a clock: what the CLI and the integration
//! tests run the bridge against.

use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::Instant;

use crate::bridge::{Bridge, PumpReport};
use crate::config::Config;
use crate::dom::{NodeId, Page, Rect};
use crate::error::DomError;
use crate::events::{BridgeEvent, EventReceiver, drain, event_bus};
use crate::settings::SettingsStore;

/// Upper bound on timer rounds in [`HostSession::settle`].
const MAX_SETTLE_ROUNDS: usize = 64;

/// Page layout the session builds:
/// `body > .main-content > .game-text-container > #<output id>`.
pub struct HostSession {
    page: Page,
    bridge: Bridge,
    events: EventReceiver,
    output: NodeId,
    now_ms: u64,
}

impl HostSession {
    pub fn new(config: &Config, settings: Box<dyn SettingsStore>, url: &str) -> Result<Self, DomError> {
        let mut page = Page::new(url);
        let output = build_story_page(&mut page, config)?;
        let (tx, events) = event_bus(config.events.capacity);
        let mut bridge = Bridge::new(config, settings, tx);
        bridge.start(&mut page, 0);
        Ok(Self {
            page,
            bridge,
            events,
            output,
            now_ms: 0,
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub fn bridge_mut(&mut self) -> &mut Bridge {
        &mut self.bridge
    }

    pub fn output(&self) -> NodeId {
        self.output
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Append one chunk of story text the way the host UI does: a new
    /// paragraph under the output container. Returns the text node.
    pub fn append_output(&mut self, text: &str) -> Result<NodeId, DomError> {
        let doc = &mut self.page.document;
        let paragraph = doc.create_element("p");
        let node = doc.create_text(text);
        doc.append_child(paragraph, node)?;
        doc.append_child(self.output, paragraph)?;
        Ok(node)
    }

    pub fn advance(&mut self, ms: u64) -> PumpReport {
        self.advance_to(self.now_ms.saturating_add(ms))
    }

    pub fn advance_to(&mut self, now_ms: u64) -> PumpReport {
        self.now_ms = self.now_ms.max(now_ms);
        self.bridge.pump(&mut self.page, self.now_ms)
    }

    /// Run the clock forward until no bridge timer is left.
    pub fn settle(&mut self) -> PumpReport {
        let mut total = self.advance(0);
        for _ in 0..MAX_SETTLE_ROUNDS {
            let Some(due) = self.bridge.next_due() else {
                break;
            };
            total.merge(&self.advance_to(due));
        }
        total
    }

    pub fn navigate(&mut self, url: &str) {
        self.page.navigate(url);
    }

    pub fn visible_text(&self) -> String {
        self.page.document.text_content(self.output)
    }

    pub fn widget_bar_html(&self) -> Option<String> {
        self.bridge
            .widgets()
            .container()
            .map(|bar| self.page.document.outer_html(bar))
    }

    pub fn take_events(&mut self) -> Vec<BridgeEvent> {
        drain(&mut self.events)
    }

    pub fn teardown(&mut self) {
        self.bridge.teardown(&mut self.page);
    }
}

fn build_story_page(page: &mut Page, config: &Config) -> Result<NodeId, DomError> {
    let viewport = page.viewport();
    let doc = &mut page.document;
    let main = doc.create_element("main");
    doc.set_attr(main, "class", &config.layout.fallback_anchor_class)?;
    let column = doc.create_element("div");
    doc.set_attr(column, "class", &config.layout.primary_anchor_class)?;
    let output = doc.create_element("div");
    doc.set_attr(output, "id", &config.observer.output_container_id)?;

    let body = doc.body();
    doc.append_child(body, main)?;
    doc.append_child(main, column)?;
    doc.append_child(column, output)?;

    doc.set_rect(main, Rect::new(0.0, 0.0, viewport.width, viewport.height))?;
    let column_width = (viewport.width * 0.75).round();
    let column_left = ((viewport.width - column_width) / 2.0).round();
    doc.set_rect(column, Rect::new(column_left, 64.0, column_width, viewport.height - 64.0))?;
    Ok(output)
}

/// Feed lines from `reader` into the session as story chunks, pumping on every
/// line and every `tick` of wall-clock time. Events are handed to `on_event`
/// as they appear. Returns how many lines were fed.
pub async fn drive_lines<R, F>(
    session: &mut HostSession,
    reader: R,
    tick: Duration,
    mut on_event: F,
) -> anyhow::Result<usize>
where
    R: AsyncBufRead + Unpin,
    F: FnMut(&BridgeEvent),
{
    let started = Instant::now();
    let base_ms = session.now_ms();
    let mut lines = reader.lines();
    let mut ticker = tokio::time::interval(tick);
    let mut fed = 0;

    loop {
        let mut finished = false;
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    if !line.trim().is_empty() {
                        session.append_output(&line)?;
                        fed += 1;
                    }
                }
                None => finished = true,
            },
            _ = ticker.tick() => {}
        }
        let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        session.advance_to(base_ms.saturating_add(elapsed));
        for event in session.take_events() {
            on_event(&event);
        }
        if finished {
            break;
        }
    }

    session.settle();
    for event in session.take_events() {
        on_event(&event);
    }
    tracing::debug!(lines = fed, "input exhausted");
    Ok(fed)
}
