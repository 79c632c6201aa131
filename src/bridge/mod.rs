//! The bridge: watches the story output, pulls protocol messages out of it,
//! and drives the widget bar.

pub mod context;
pub mod dispatch;
pub mod driver;

pub use context::{ContextChange, ContextWatcher, adventure_id};
pub use dispatch::{DispatchOutcome, Dispatcher, RegisteredScript};
pub use driver::{ObservationDriver, StripGuard};

use std::fmt;

use crate::config::Config;
use crate::dom::{NodeId, NodeKind, Page};
use crate::error::BridgeError;
use crate::events::{BridgeEvent, EventReceiver, EventSender, emit};
use crate::layout::LayoutManager;
use crate::protocol::{DedupCache, Parser};
use crate::scheduler::{PeriodicTask, Scheduler, TimerId};
use crate::settings::{SettingsStore, load_debug_mode, save_debug_mode};
use crate::widgets::WidgetRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum BridgeTimer {
    DedupSweep,
    ContextCheck,
    Layout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Running,
    TornDown,
}

/// Tally of one `start` or `pump`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PumpReport {
    /// Protocol spans found in changed text.
    pub spans: usize,
    pub dispatched: usize,
    /// Repeats inside the dedup window.
    pub suppressed: usize,
    /// Oversize, malformed or invalid spans.
    pub rejected: usize,
    /// Spans removed from the page.
    pub stripped: usize,
    pub context_changed: bool,
}

impl PumpReport {
    pub fn merge(&mut self, other: &PumpReport) {
        self.spans += other.spans;
        self.dispatched += other.dispatched;
        self.suppressed += other.suppressed;
        self.rejected += other.rejected;
        self.stripped += other.stripped;
        self.context_changed |= other.context_changed;
    }
}

/// Ties the observation driver, parser, dedup cache, dispatcher, widget
/// registry and layout manager to one host page.
///
/// The host calls [`Bridge::pump`] with its clock whenever it has delivered
/// mutations or time has passed. Nothing in here returns an error to the
/// host: failures are logged and surfaced on the event bus.
pub struct Bridge {
    parser: Parser,
    dedup: DedupCache,
    sweep: PeriodicTask,
    scheduler: Scheduler<BridgeTimer>,
    driver: ObservationDriver,
    context: ContextWatcher,
    layout: LayoutManager,
    widgets: WidgetRegistry,
    dispatcher: Dispatcher,
    settings: Box<dyn SettingsStore>,
    events: EventSender,
    positioned: Option<NodeId>,
    lifecycle: Lifecycle,
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("lifecycle", &self.lifecycle)
            .field("widgets", &self.widgets.len())
            .field("timers", &self.scheduler.active())
            .field("settings", &self.settings.name())
            .finish_non_exhaustive()
    }
}

impl Bridge {
    pub fn new(config: &Config, settings: Box<dyn SettingsStore>, events: EventSender) -> Self {
        let protocol = &config.protocol;
        let mut driver = ObservationDriver::new(config.observer.output_container_id.clone());
        driver.set_debug_mode(load_debug_mode(settings.as_ref()));
        Self {
            parser: Parser::new(protocol.max_message_bytes, &protocol.supported_version),
            dedup: DedupCache::new(protocol.dedup_window()),
            sweep: PeriodicTask::new(protocol.dedup_sweep_interval()),
            scheduler: Scheduler::new(),
            driver,
            context: ContextWatcher::new(config.observer.context_debounce()),
            layout: LayoutManager::new(&config.layout),
            widgets: WidgetRegistry::new(config.widgets.bar_container_id.clone(), events.clone()),
            dispatcher: Dispatcher::new(events.clone()),
            settings,
            events,
            positioned: None,
            lifecycle: Lifecycle::Idle,
        }
    }

    /// Attach to `page` and process whatever the output already holds.
    pub fn start(&mut self, page: &mut Page, now_ms: u64) -> PumpReport {
        let mut report = PumpReport::default();
        if self.lifecycle == Lifecycle::Running {
            tracing::debug!("bridge already running");
            return report;
        }
        self.scheduler.advance_to(now_ms);
        self.context.watch_navigation(&mut *page);
        self.context.watch_mutations(&mut page.document);
        self.layout.attach(page);
        self.lifecycle = Lifecycle::Running;
        tracing::info!(
            adventure = self.context.current().unwrap_or_default(),
            debug_mode = self.driver.debug_mode(),
            "bridge started"
        );
        if let Some(container) = self.driver.attach(&mut page.document) {
            self.process_existing(page, container, now_ms, &mut report);
        }
        self.position_new_bar(page);
        report
    }

    /// Deliver timers due by `now_ms` and every queued host notification.
    pub fn pump(&mut self, page: &mut Page, now_ms: u64) -> PumpReport {
        let mut report = PumpReport::default();
        if self.lifecycle != Lifecycle::Running {
            return report;
        }
        for (id, timer) in self.scheduler.advance_to(now_ms) {
            self.on_timer(page, id, timer, now_ms, &mut report);
        }

        for node in self.driver.take_changed_text(&mut page.document) {
            self.process_node(page, node, now_ms, &mut report);
        }

        if self.context.take_navigations(&mut *page) {
            self.recheck_context(page, now_ms, &mut report);
        }
        self.context
            .take_mutations(&mut page.document, &mut self.scheduler, BridgeTimer::ContextCheck);
        self.layout.poll(page, &mut self.scheduler, BridgeTimer::Layout);
        self.position_new_bar(page);
        report
    }

    /// Release every observer, subscription, timer and widget. Safe in any
    /// state and safe to repeat.
    pub fn teardown(&mut self, page: &mut Page) {
        if self.lifecycle == Lifecycle::TornDown {
            return;
        }
        self.driver.detach(&mut page.document);
        self.context.unwatch_navigation(&mut *page);
        self.context
            .unwatch_mutations(&mut page.document, &mut self.scheduler);
        self.layout.detach(page, &mut self.scheduler);
        self.sweep.suspend(&mut self.scheduler);
        self.scheduler.clear();
        let removed = self.widgets.clear_all(&mut page.document);
        self.dedup.clear();
        self.positioned = None;
        self.lifecycle = Lifecycle::TornDown;
        tracing::info!(widgets = removed, "bridge torn down");
    }

    /// Toggle debug mode and persist it. The in-memory flag changes even when
    /// the store cannot be written.
    pub fn set_debug_mode(&mut self, enabled: bool) -> Result<(), BridgeError> {
        self.driver.set_debug_mode(enabled);
        tracing::info!(enabled, "debug mode changed");
        save_debug_mode(self.settings.as_mut(), enabled)?;
        Ok(())
    }

    pub fn debug_mode(&self) -> bool {
        self.driver.debug_mode()
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    pub fn widgets(&self) -> &WidgetRegistry {
        &self.widgets
    }

    pub fn registered_scripts(&self) -> Vec<&RegisteredScript> {
        self.dispatcher.scripts().collect()
    }

    pub fn adventure(&self) -> Option<&str> {
        self.context.current()
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    pub fn is_observing(&self) -> bool {
        self.driver.is_observing()
    }

    pub fn active_timers(&self) -> usize {
        self.scheduler.active()
    }

    /// When the host should pump next even if nothing else happens.
    pub fn next_due(&self) -> Option<u64> {
        self.scheduler.next_due()
    }

    pub fn dedup_entries(&self) -> usize {
        self.dedup.len()
    }

    fn on_timer(&mut self, page: &mut Page, id: TimerId, timer: BridgeTimer, now_ms: u64, report: &mut PumpReport) {
        tracing::trace!(timer = %timer, now_ms, "timer fired");
        match timer {
            BridgeTimer::DedupSweep => {
                if self.sweep.fired(id) {
                    let evicted = self.dedup.sweep(now_ms);
                    tracing::trace!(evicted, remaining = self.dedup.len(), "dedup sweep");
                    let has_work = !self.dedup.is_empty();
                    self.sweep
                        .reschedule_if(&mut self.scheduler, BridgeTimer::DedupSweep, has_work);
                }
            }
            BridgeTimer::ContextCheck => {
                if self.context.fired(id) {
                    self.recheck_context(page, now_ms, report);
                }
            }
            BridgeTimer::Layout => {
                if self.layout.fired(id)
                    && let Some(bar) = self.widgets.container()
                {
                    self.layout.apply(page, bar);
                }
            }
        }
    }

    /// Parse, strip, then dispatch every span in one text node. Spans are
    /// stripped whatever their parse or dedup outcome.
    fn process_node(&mut self, page: &mut Page, node: NodeId, now_ms: u64, report: &mut PumpReport) {
        let text = match page.document.kind(node) {
            Some(NodeKind::Text(text)) => text.clone(),
            _ => return,
        };
        let parsed = self.parser.parse_text(&text);
        if parsed.is_empty() {
            return;
        }
        report.spans += parsed.len();

        match self.driver.strip(&mut page.document, node) {
            Ok(removed) => report.stripped += removed,
            Err(e) => tracing::warn!(node = %node, error = %e, "failed to strip protocol text"),
        }

        for span in parsed {
            let envelope = match span.outcome {
                Ok(envelope) => envelope,
                Err(_) => {
                    report.rejected += 1;
                    continue;
                }
            };
            if !self.dedup.should_process(span.fingerprint, now_ms) {
                tracing::debug!(fingerprint = span.fingerprint, "duplicate message suppressed");
                report.suppressed += 1;
                continue;
            }
            self.sweep
                .ensure_running(&mut self.scheduler, BridgeTimer::DedupSweep);
            self.dispatcher
                .dispatch(&envelope.message, &mut page.document, &mut self.widgets, now_ms);
            report.dispatched += 1;
        }
    }

    fn process_existing(&mut self, page: &mut Page, container: NodeId, now_ms: u64, report: &mut PumpReport) {
        for node in self.driver.scan(&page.document, container) {
            self.process_node(page, node, now_ms, report);
        }
    }

    /// A new adventure wipes widgets, dedup state and registered scripts.
    /// The output container is re-located afterwards, since the page may have
    /// replaced it.
    fn recheck_context(&mut self, page: &mut Page, now_ms: u64, report: &mut PumpReport) {
        if let Some(change) = self.context.check(&*page) {
            tracing::info!(
                from = change.from.as_deref().unwrap_or_default(),
                to = change.to.as_deref().unwrap_or_default(),
                "adventure context changed"
            );
            let cleared = self.widgets.clear_all(&mut page.document);
            self.dedup.clear();
            self.sweep.suspend(&mut self.scheduler);
            self.dispatcher.clear_scripts();
            emit(&self.events, BridgeEvent::Cleared { widgets: cleared });
            report.context_changed = true;
        }
        if let Some(container) = self.driver.attach(&mut page.document) {
            self.process_existing(page, container, now_ms, report);
        }
    }

    fn position_new_bar(&mut self, page: &mut Page) {
        let container = self.widgets.container();
        if container == self.positioned {
            return;
        }
        if let Some(bar) = container {
            self.layout.apply(page, bar);
        }
        self.positioned = container;
    }
}
