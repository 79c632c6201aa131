use std::collections::HashMap;

use super::document::{Document, NodeId, Rect};
use crate::error::DomError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// What a host subscription listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostTopic {
    /// Window resize and orientation change.
    Window,
    /// Size changes of one element.
    ElementSize(NodeId),
    /// History navigation (push/replace/pop).
    Navigation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    WindowResized(Viewport),
    OrientationChanged(Viewport),
    ElementResized { node: NodeId, rect: Rect },
    Navigated { url: String },
}

impl HostEvent {
    fn matches(&self, topic: HostTopic) -> bool {
        match (self, topic) {
            (Self::WindowResized(_) | Self::OrientationChanged(_), HostTopic::Window) => true,
            (Self::ElementResized { node, .. }, HostTopic::ElementSize(target)) => *node == target,
            (Self::Navigated { .. }, HostTopic::Navigation) => true,
            _ => false,
        }
    }
}

#[derive(Debug)]
struct Subscription {
    topic: HostTopic,
    queue: Vec<HostEvent>,
}

/// Source of history-navigation notifications.
///
/// In a browser this is backed by patched history functions; the bridge only
/// ever sees subscribe / drain / unsubscribe.
pub trait NavigationSource {
    fn current_url(&self) -> &str;
    fn subscribe_navigation(&mut self) -> SubscriptionId;
    fn take_navigations(&mut self, id: SubscriptionId) -> Vec<String>;
    fn unsubscribe_navigation(&mut self, id: SubscriptionId);
}

/// The host page: document, viewport, URL, and the subscriptions the bridge
/// holds on them.
#[derive(Debug)]
pub struct Page {
    pub document: Document,
    viewport: Viewport,
    url: String,
    subscriptions: HashMap<SubscriptionId, Subscription>,
    next_subscription: u64,
}

impl Page {
    pub fn new(url: &str) -> Self {
        Self {
            document: Document::new(),
            viewport: Viewport::default(),
            url: url.to_string(),
            subscriptions: HashMap::new(),
            next_subscription: 1,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn subscribe(&mut self, topic: HostTopic) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscriptions.insert(
            id,
            Subscription {
                topic,
                queue: Vec::new(),
            },
        );
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscriptions.remove(&id);
    }

    pub fn take_events(&mut self, id: SubscriptionId) -> Vec<HostEvent> {
        self.subscriptions
            .get_mut(&id)
            .map(|s| std::mem::take(&mut s.queue))
            .unwrap_or_default()
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.len()
    }

    fn publish(&mut self, event: &HostEvent) {
        for sub in self.subscriptions.values_mut() {
            if event.matches(sub.topic) {
                sub.queue.push(event.clone());
            }
        }
    }

    // ── Host-side actions (what the user or the web app does) ───────────

    pub fn resize_window(&mut self, width: f64, height: f64) {
        self.viewport = Viewport { width, height };
        self.publish(&HostEvent::WindowResized(self.viewport));
    }

    pub fn rotate(&mut self) {
        self.viewport = Viewport {
            width: self.viewport.height,
            height: self.viewport.width,
        };
        self.publish(&HostEvent::OrientationChanged(self.viewport));
    }

    /// Give `node` a new layout box and notify size observers when it changed.
    pub fn resize_element(&mut self, node: NodeId, rect: Rect) -> Result<(), DomError> {
        let previous = self.document.rect(node);
        self.document.set_rect(node, rect)?;
        let size_changed = previous.is_none_or(|p| p.width != rect.width || p.height != rect.height);
        if size_changed {
            self.publish(&HostEvent::ElementResized { node, rect });
        }
        Ok(())
    }

    pub fn navigate(&mut self, url: &str) {
        self.url = url.to_string();
        self.publish(&HostEvent::Navigated {
            url: url.to_string(),
        });
    }
}

impl NavigationSource for Page {
    fn current_url(&self) -> &str {
        &self.url
    }

    fn subscribe_navigation(&mut self) -> SubscriptionId {
        self.subscribe(HostTopic::Navigation)
    }

    fn take_navigations(&mut self, id: SubscriptionId) -> Vec<String> {
        self.take_events(id)
            .into_iter()
            .filter_map(|event| match event {
                HostEvent::Navigated { url } => Some(url),
                _ => None,
            })
            .collect()
    }

    fn unsubscribe_navigation(&mut self, id: SubscriptionId) {
        self.unsubscribe(id);
    }
}
