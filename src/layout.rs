use crate::config::LayoutConfig;
use crate::dom::{HostEvent, HostTopic, NodeId, Page, SubscriptionId};
use crate::scheduler::{Debouncer, Scheduler, TimerId};

/// Where the bar's left/width came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum AnchorSource {
    Primary,
    Fallback,
    Viewport,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub left: f64,
    pub width: f64,
    pub source: AnchorSource,
}

/// Keeps the widget bar aligned under a reference region of the host page.
///
/// Window resize, orientation change and anchor resize all feed one
/// trailing-edge debounce, so a burst of layout churn costs one recompute.
#[derive(Debug)]
pub struct LayoutManager {
    primary_class: String,
    fallback_class: String,
    debounce: Debouncer,
    window_subscription: Option<SubscriptionId>,
    anchor_subscription: Option<(NodeId, SubscriptionId)>,
    last: Option<Placement>,
}

impl LayoutManager {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            primary_class: config.primary_anchor_class.clone(),
            fallback_class: config.fallback_anchor_class.clone(),
            debounce: Debouncer::new(config.debounce()),
            window_subscription: None,
            anchor_subscription: None,
            last: None,
        }
    }

    /// Primary anchor box, then the fallback region, then the full viewport.
    /// Anchors without a laid-out box are skipped.
    pub fn compute(&self, page: &Page) -> Placement {
        let doc = &page.document;
        let candidates = [
            (&self.primary_class, AnchorSource::Primary),
            (&self.fallback_class, AnchorSource::Fallback),
        ];
        for (class, source) in candidates {
            let rect = doc
                .find_by_class(class)
                .and_then(|node| doc.rect(node))
                .filter(|rect| rect.width > 0.0 && rect.left.is_finite());
            if let Some(rect) = rect {
                return Placement {
                    left: rect.left,
                    width: rect.width,
                    source,
                };
            }
        }
        Placement {
            left: 0.0,
            width: page.viewport().width,
            source: AnchorSource::Viewport,
        }
    }

    /// Compute and write `left`/`width` onto `bar`. Never fails: a bar that
    /// has gone away is logged and skipped.
    pub fn apply(&mut self, page: &mut Page, bar: NodeId) -> Placement {
        let placement = self.compute(page);
        let doc = &mut page.document;
        let written = doc
            .set_style(bar, "left", &format!("{}px", placement.left))
            .and_then(|()| doc.set_style(bar, "width", &format!("{}px", placement.width)));
        match written {
            Ok(()) => {
                if self.last != Some(placement) {
                    tracing::debug!(
                        source = %placement.source,
                        left = placement.left,
                        width = placement.width,
                        "widget bar positioned"
                    );
                }
                self.last = Some(placement);
            }
            Err(e) => tracing::debug!(error = %e, "widget bar not positioned"),
        }
        placement
    }

    pub fn attach(&mut self, page: &mut Page) {
        if self.window_subscription.is_none() {
            self.window_subscription = Some(page.subscribe(HostTopic::Window));
        }
        self.track_anchor(page);
    }

    /// Drain host layout events; any relevant one (re)starts the debounce.
    /// Returns whether a recompute is now pending because of this call.
    pub fn poll<K: Clone>(&mut self, page: &mut Page, scheduler: &mut Scheduler<K>, kind: K) -> bool {
        let mut events: Vec<HostEvent> = Vec::new();
        if let Some(id) = self.window_subscription {
            events.extend(page.take_events(id));
        }
        if let Some((_, id)) = self.anchor_subscription {
            events.extend(page.take_events(id));
        }
        // The SPA may swap the anchor element; follow the current one.
        let anchor_changed = self.track_anchor(page);
        if events.is_empty() && !anchor_changed {
            return false;
        }
        tracing::trace!(events = events.len(), anchor_changed, "layout change detected");
        self.debounce.trigger(scheduler, kind);
        true
    }

    /// Claim a fired timer for this manager's debounce.
    pub fn fired(&mut self, id: TimerId) -> bool {
        self.debounce.fired(id)
    }

    pub fn detach<K: Clone>(&mut self, page: &mut Page, scheduler: &mut Scheduler<K>) {
        if let Some(id) = self.window_subscription.take() {
            page.unsubscribe(id);
        }
        if let Some((_, id)) = self.anchor_subscription.take() {
            page.unsubscribe(id);
        }
        self.debounce.cancel(scheduler);
        self.last = None;
    }

    pub fn is_attached(&self) -> bool {
        self.window_subscription.is_some()
    }

    pub fn last_placement(&self) -> Option<Placement> {
        self.last
    }

    /// Keep the size subscription pointed at the current primary anchor.
    /// Returns true when the anchor element changed.
    fn track_anchor(&mut self, page: &mut Page) -> bool {
        if self.window_subscription.is_none() {
            return false;
        }
        let current = page.document.find_by_class(&self.primary_class);
        let tracked = self.anchor_subscription.map(|(node, _)| node);
        if current == tracked {
            return false;
        }
        if let Some((_, id)) = self.anchor_subscription.take() {
            page.unsubscribe(id);
        }
        if let Some(node) = current {
            self.anchor_subscription = Some((node, page.subscribe(HostTopic::ElementSize(node))));
        }
        true
    }
}
