use url::Url;

use crate::dom::{Document, MutationKind, NavigationSource, ObserverId, SubscriptionId};
use crate::scheduler::{Debouncer, Scheduler, TimerId};

/// The adventure id: the path segment right after `adventure`.
pub fn adventure_id(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let mut segments = url.path_segments()?;
    segments.find(|segment| *segment == "adventure")?;
    segments
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextChange {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Notices when the user moves to a different adventure.
///
/// Navigation events ask for an immediate re-check; general page mutations
/// feed a trailing debounce first, since the SPA can swap content without a
/// history entry.
#[derive(Debug)]
pub struct ContextWatcher {
    current: Option<String>,
    navigation: Option<SubscriptionId>,
    page_observer: Option<ObserverId>,
    debounce: Debouncer,
}

impl ContextWatcher {
    pub fn new(debounce: std::time::Duration) -> Self {
        Self {
            current: None,
            navigation: None,
            page_observer: None,
            debounce: Debouncer::new(debounce),
        }
    }

    /// Record the current adventure and start listening for navigation.
    pub fn watch_navigation(&mut self, nav: &mut impl NavigationSource) {
        self.current = adventure_id(nav.current_url());
        if self.navigation.is_none() {
            self.navigation = Some(nav.subscribe_navigation());
        }
        tracing::debug!(adventure = self.current.as_deref().unwrap_or_default(), "tracking adventure context");
    }

    pub fn watch_mutations(&mut self, doc: &mut Document) {
        if self.page_observer.is_none() {
            self.page_observer = Some(doc.observe(doc.body()));
        }
    }

    /// Returns true when a navigation happened and the context must be
    /// re-checked now.
    pub fn take_navigations(&mut self, nav: &mut impl NavigationSource) -> bool {
        let Some(id) = self.navigation else {
            return false;
        };
        let urls = nav.take_navigations(id);
        if let Some(url) = urls.last() {
            tracing::debug!(url = %url, count = urls.len(), "navigation observed");
        }
        !urls.is_empty()
    }

    /// Drain page mutations; any structural change restarts the debounce.
    pub fn take_mutations<K: Clone>(&mut self, doc: &mut Document, scheduler: &mut Scheduler<K>, kind: K) -> bool {
        let Some(id) = self.page_observer else {
            return false;
        };
        let structural = doc
            .take_records(id)
            .iter()
            .any(|record| matches!(record.kind, MutationKind::ChildList { .. }));
        if structural {
            self.debounce.trigger(scheduler, kind);
        }
        structural
    }

    pub fn fired(&mut self, id: TimerId) -> bool {
        self.debounce.fired(id)
    }

    /// Compare the page URL against the recorded adventure.
    pub fn check(&mut self, nav: &impl NavigationSource) -> Option<ContextChange> {
        let now = adventure_id(nav.current_url());
        if now == self.current {
            return None;
        }
        let from = std::mem::replace(&mut self.current, now.clone());
        Some(ContextChange { from, to: now })
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn unwatch_navigation(&mut self, nav: &mut impl NavigationSource) {
        if let Some(id) = self.navigation.take() {
            nav.unsubscribe_navigation(id);
        }
    }

    pub fn unwatch_mutations<K: Clone>(&mut self, doc: &mut Document, scheduler: &mut Scheduler<K>) {
        if let Some(id) = self.page_observer.take() {
            doc.unobserve(id);
        }
        self.debounce.cancel(scheduler);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Page;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Timer {
        Context,
    }

    #[test]
    fn adventure_id_from_path() {
        assert_eq!(
            adventure_id("https://play.example/adventure/abc123/the-lost-keep/play").as_deref(),
            Some("abc123")
        );
        assert_eq!(adventure_id("https://play.example/adventure/42").as_deref(), Some("42"));
        assert_eq!(adventure_id("https://play.example/adventure/"), None);
        assert_eq!(adventure_id("https://play.example/profile"), None);
        assert_eq!(adventure_id("not a url"), None);
    }

    #[test]
    fn navigation_to_new_adventure_is_a_change() {
        let mut page = Page::new("https://play.example/adventure/one");
        let mut watcher = ContextWatcher::new(Duration::from_millis(150));
        watcher.watch_navigation(&mut page);
        assert_eq!(watcher.current(), Some("one"));

        page.navigate("https://play.example/adventure/one/chapter-2");
        assert!(watcher.take_navigations(&mut page));
        assert_eq!(watcher.check(&page), None);

        page.navigate("https://play.example/adventure/two");
        assert!(watcher.take_navigations(&mut page));
        assert_eq!(
            watcher.check(&page),
            Some(ContextChange {
                from: Some("one".into()),
                to: Some("two".into()),
            })
        );
        assert_eq!(watcher.current(), Some("two"));
    }

    #[test]
    fn mutation_bursts_debounce_into_one_check() {
        let mut page = Page::new("https://play.example/adventure/one");
        let mut scheduler: Scheduler<Timer> = Scheduler::new();
        let mut watcher = ContextWatcher::new(Duration::from_millis(150));
        watcher.watch_mutations(&mut page.document);

        for _ in 0..3 {
            let node = page.document.create_element("div");
            let body = page.document.body();
            page.document.append_child(body, node).unwrap();
            assert!(watcher.take_mutations(&mut page.document, &mut scheduler, Timer::Context));
        }
        assert_eq!(scheduler.active(), 1);
        let fired = scheduler.advance_to(150);
        assert_eq!(fired.len(), 1);
        assert!(watcher.fired(fired[0].0));
    }

    #[test]
    fn detach_releases_subscription_observer_and_timer() {
        let mut page = Page::new("https://play.example/adventure/one");
        let mut scheduler: Scheduler<Timer> = Scheduler::new();
        let mut watcher = ContextWatcher::new(Duration::from_millis(150));
        watcher.watch_navigation(&mut page);
        watcher.watch_mutations(&mut page.document);
        let node = page.document.create_element("div");
        let body = page.document.body();
        page.document.append_child(body, node).unwrap();
        watcher.take_mutations(&mut page.document, &mut scheduler, Timer::Context);

        watcher.unwatch_navigation(&mut page);
        watcher.unwatch_mutations(&mut page.document, &mut scheduler);
        assert_eq!(page.active_subscriptions(), 0);
        assert_eq!(page.document.active_observers(), 0);
        assert_eq!(scheduler.active(), 0);
    }
}
