use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::config::{WidgetConfig, WidgetKind, Zone};
use super::render::render;
use super::view::{VNode, build, patch};
use crate::dom::{Document, NodeId};
use crate::error::BridgeError;
use crate::events::{BridgeEvent, EventSender, WidgetEventAction, emit};

pub const DEFAULT_CONTAINER_ID: &str = "bd-widget-bar";

/// One live widget: its last applied config and the element it owns.
#[derive(Debug)]
pub struct WidgetRecord {
    config: WidgetConfig,
    element: NodeId,
    view: VNode,
}

impl WidgetRecord {
    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn element(&self) -> NodeId {
        self.element
    }

    pub fn kind(&self) -> WidgetKind {
        self.config.kind()
    }
}

#[derive(Debug, Clone, Copy)]
struct WidgetBar {
    root: NodeId,
    zones: [NodeId; 3],
}

impl WidgetBar {
    fn zone(&self, zone: Zone) -> NodeId {
        match zone {
            Zone::Left => self.zones[0],
            Zone::Center => self.zones[1],
            Zone::Right => self.zones[2],
        }
    }
}

/// `id -> WidgetRecord` plus the floating bar that hosts their elements.
///
/// The bar is created with the first widget and removed with the last.
/// Every create/update/destroy reports its outcome on the event bus, so
/// callers only need the returned `Result` for their own bookkeeping.
#[derive(Debug)]
pub struct WidgetRegistry {
    container_id: String,
    records: BTreeMap<String, WidgetRecord>,
    bar: Option<WidgetBar>,
    events: EventSender,
}

impl WidgetRegistry {
    pub fn new(container_id: impl Into<String>, events: EventSender) -> Self {
        Self {
            container_id: container_id.into(),
            records: BTreeMap::new(),
            bar: None,
            events,
        }
    }

    /// Create a widget. An existing widget of the same type is updated
    /// instead; one of a different type is replaced.
    pub fn create(
        &mut self,
        doc: &mut Document,
        id: &str,
        config: &Map<String, Value>,
    ) -> Result<WidgetEventAction, BridgeError> {
        self.prune_detached(doc);
        let result = self.try_create(doc, id, config);
        self.report(id, result)
    }

    /// Shallow-merge `partial` onto the stored config, creating the widget
    /// when it does not exist yet.
    pub fn update(
        &mut self,
        doc: &mut Document,
        id: &str,
        partial: &Map<String, Value>,
    ) -> Result<WidgetEventAction, BridgeError> {
        self.prune_detached(doc);
        let result = match self.records.get(id) {
            Some(record) => {
                let kind = record.kind();
                record
                    .config
                    .merge(id, partial)
                    .map_err(BridgeError::from)
                    .and_then(|merged| self.apply(doc, id, merged))
                    .map(|()| (WidgetEventAction::Updated, kind))
            }
            None => {
                tracing::debug!(widget = id, "update for unknown widget, creating it");
                self.try_create(doc, id, partial)
            }
        };
        self.report(id, result)
    }

    /// Remove a widget. Returns false when no widget had that id.
    pub fn destroy(&mut self, doc: &mut Document, id: &str) -> Result<bool, BridgeError> {
        self.prune_detached(doc);
        let Some(record) = self.records.remove(id) else {
            tracing::debug!(widget = id, "destroy for unknown widget ignored");
            return Ok(false);
        };
        let kind = record.kind();
        let result = remove_element(doc, record.element)
            .and_then(|()| self.release_bar_if_empty(doc))
            .map(|()| (WidgetEventAction::Destroyed, kind));
        self.report(id, result).map(|_| true)
    }

    /// Destroy every widget and the bar. Returns how many widgets were removed.
    pub fn clear_all(&mut self, doc: &mut Document) -> usize {
        let records = std::mem::take(&mut self.records);
        for (id, record) in &records {
            if let Err(e) = remove_element(doc, record.element) {
                tracing::warn!(widget = %id, error = %e, "failed to remove widget element");
            }
        }
        if let Err(e) = self.release_bar_if_empty(doc) {
            tracing::warn!(error = %e, "failed to remove widget bar");
        }
        records.len()
    }

    pub fn get(&self, id: &str) -> Option<&WidgetRecord> {
        self.records.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The bar container, while at least one widget is live.
    pub fn container(&self) -> Option<NodeId> {
        self.bar.map(|bar| bar.root)
    }

    pub fn zone_container(&self, zone: Zone) -> Option<NodeId> {
        self.bar.map(|bar| bar.zone(zone))
    }

    fn try_create(
        &mut self,
        doc: &mut Document,
        id: &str,
        raw: &Map<String, Value>,
    ) -> Result<(WidgetEventAction, WidgetKind), BridgeError> {
        let config = WidgetConfig::parse(id, raw.clone())?;
        let kind = config.kind();

        if let Some(existing) = self.records.get(id) {
            if existing.kind() == kind {
                let merged = existing.config.merge(id, raw)?;
                self.apply(doc, id, merged)?;
                return Ok((WidgetEventAction::Updated, kind));
            }
            tracing::debug!(
                widget = id,
                from = %existing.kind(),
                to = %kind,
                "widget type changed, recreating"
            );
            if let Some(old) = self.records.remove(id) {
                remove_element(doc, old.element)?;
            }
        }

        let zone = self.ensure_bar(doc)?.zone(config.zone());
        let view = render(id, &config);
        let element = build(doc, &view)?;
        if let Err(e) = doc.append_child(zone, element) {
            remove_element(doc, element)?;
            return Err(e.into());
        }
        self.records.insert(
            id.to_string(),
            WidgetRecord {
                config,
                element,
                view,
            },
        );
        Ok((WidgetEventAction::Created, kind))
    }

    /// Re-render an existing widget from `config`, patching its element in
    /// place and moving it when the zone changed.
    fn apply(&mut self, doc: &mut Document, id: &str, config: WidgetConfig) -> Result<(), BridgeError> {
        let zone = self.ensure_bar(doc)?.zone(config.zone());
        let Some(record) = self.records.get_mut(id) else {
            return Ok(());
        };
        let view = render(id, &config);
        record.element = patch(doc, record.element, &record.view, &view)?;
        if record.config.zone() != config.zone() {
            doc.append_child(zone, record.element)?;
        }
        record.view = view;
        record.config = config;
        Ok(())
    }

    fn ensure_bar(&mut self, doc: &mut Document) -> Result<WidgetBar, BridgeError> {
        if let Some(bar) = self.bar
            && doc.contains(bar.root)
        {
            return Ok(bar);
        }
        let root = doc.create_element("div");
        doc.set_attr(root, "id", &self.container_id)?;
        doc.set_attr(root, "class", "bd-widget-bar")?;
        let mut zones = [root; 3];
        for (slot, zone) in zones.iter_mut().zip(Zone::ALL) {
            let node = doc.create_element("div");
            doc.set_attr(node, "class", &format!("bd-zone bd-zone-{zone}"))?;
            doc.set_attr(node, "data-zone", zone.as_ref())?;
            doc.append_child(root, node)?;
            *slot = node;
        }
        let body = doc.body();
        doc.append_child(body, root)?;
        tracing::debug!(container = %self.container_id, "widget bar created");
        let bar = WidgetBar { root, zones };
        self.bar = Some(bar);
        Ok(bar)
    }

    fn release_bar_if_empty(&mut self, doc: &mut Document) -> Result<(), BridgeError> {
        if !self.records.is_empty() {
            return Ok(());
        }
        if let Some(bar) = self.bar.take() {
            remove_element(doc, bar.root)?;
            tracing::debug!(container = %self.container_id, "widget bar removed");
        }
        Ok(())
    }

    /// The host page may throw the bar away (e.g. a full re-render) or pull
    /// single widgets out of it. Records whose element is no longer inside
    /// the bar are forgotten so the next create builds them again.
    fn prune_detached(&mut self, doc: &mut Document) {
        let Some(bar) = self.bar else {
            return;
        };
        if !doc.contains(bar.root) {
            tracing::warn!(
                widgets = self.records.len(),
                "widget bar left the page, forgetting its widgets"
            );
            self.records.clear();
            self.bar = None;
            return;
        }
        self.records.retain(|id, record| {
            let attached = doc.is_inclusive_descendant(record.element, bar.root);
            if !attached {
                tracing::warn!(widget = %id, "widget element left the bar, forgetting it");
            }
            attached
        });
        if let Err(e) = self.release_bar_if_empty(doc) {
            tracing::warn!(error = %e, "failed to remove widget bar");
        }
    }

    fn report(
        &self,
        id: &str,
        result: Result<(WidgetEventAction, WidgetKind), BridgeError>,
    ) -> Result<WidgetEventAction, BridgeError> {
        match result {
            Ok((action, kind)) => {
                tracing::debug!(widget = id, %action, %kind, "widget changed");
                emit(
                    &self.events,
                    BridgeEvent::Widget {
                        action,
                        widget_id: id.to_string(),
                        widget_type: Some(kind),
                    },
                );
                Ok(action)
            }
            Err(e) => {
                tracing::warn!(widget = id, error = %e, "widget operation failed");
                emit(&self.events, BridgeEvent::from_error(&e, Some(id)));
                Err(e)
            }
        }
    }
}

fn remove_element(doc: &mut Document, node: NodeId) -> Result<(), BridgeError> {
    if doc.contains(node) {
        doc.remove(node)?;
    }
    Ok(())
}
