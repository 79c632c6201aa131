use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::ops::{Deref, DerefMut};

use crate::dom::{Document, MutationKind, NodeId, NodeKind, ObserverId};
use crate::error::DomError;
use crate::protocol::{contains_prefix, strip_spans};

/// Scoped suspension of output observation while protocol text is stripped.
///
/// Acquiring sets the stripping flag and disconnects every output observer;
/// dropping reconnects them and clears the flag, on every exit path including
/// unwinding. A second acquire while one is held yields `None`.
pub struct StripGuard<'a> {
    doc: &'a mut Document,
    flag: &'a Cell<bool>,
    observers: Vec<ObserverId>,
}

impl<'a> StripGuard<'a> {
    pub fn acquire(
        doc: &'a mut Document,
        flag: &'a Cell<bool>,
        observers: Vec<ObserverId>,
    ) -> Option<Self> {
        if flag.replace(true) {
            return None;
        }
        for id in &observers {
            doc.disconnect(*id);
        }
        Some(Self {
            doc,
            flag,
            observers,
        })
    }
}

impl Deref for StripGuard<'_> {
    type Target = Document;

    fn deref(&self) -> &Document {
        self.doc
    }
}

impl DerefMut for StripGuard<'_> {
    fn deref_mut(&mut self) -> &mut Document {
        self.doc
    }
}

impl Drop for StripGuard<'_> {
    fn drop(&mut self) {
        for id in &self.observers {
            self.doc.reconnect(*id);
        }
        self.flag.set(false);
    }
}

/// Watches the host's story output container for new text.
///
/// Observed containers live in a side table keyed by `NodeId`; ids of nodes
/// the host has since removed never resolve again and are pruned on the next
/// attach.
#[derive(Debug)]
pub struct ObservationDriver {
    container_id: String,
    observed: HashMap<NodeId, ObserverId>,
    stripping: Cell<bool>,
    debug_mode: bool,
}

impl ObservationDriver {
    pub fn new(container_id: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            observed: HashMap::new(),
            stripping: Cell::new(false),
            debug_mode: false,
        }
    }

    /// Observe the output container if it exists and is not observed yet.
    /// Returns the container when observation started with this call.
    pub fn attach(&mut self, doc: &mut Document) -> Option<NodeId> {
        self.prune(doc);
        let Some(container) = doc.get_element_by_id(&self.container_id) else {
            tracing::debug!(container_id = %self.container_id, "output container not present");
            return None;
        };
        if self.observed.contains_key(&container) {
            return None;
        }
        let observer = doc.observe(container);
        self.observed.insert(container, observer);
        tracing::info!(container_id = %self.container_id, node = %container, "observing output container");
        Some(container)
    }

    /// Stop observing everything. Safe to call repeatedly.
    pub fn detach(&mut self, doc: &mut Document) {
        for (_, observer) in self.observed.drain() {
            doc.unobserve(observer);
        }
    }

    pub fn is_observing(&self) -> bool {
        !self.observed.is_empty()
    }

    pub fn observers(&self) -> Vec<ObserverId> {
        self.observed.values().copied().collect()
    }

    pub fn is_stripping(&self) -> bool {
        self.stripping.get()
    }

    pub fn set_debug_mode(&mut self, enabled: bool) {
        self.debug_mode = enabled;
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    /// Drain queued mutation records and return the text nodes they touched
    /// that may carry protocol spans, in document order of discovery.
    pub fn take_changed_text(&mut self, doc: &mut Document) -> Vec<NodeId> {
        let mut touched = Vec::new();
        for observer in self.observers() {
            for record in doc.take_records(observer) {
                match record.kind {
                    MutationKind::CharacterData => touched.push(record.target),
                    MutationKind::ChildList { added, .. } => {
                        for node in added {
                            touched.extend(doc.text_nodes(node));
                        }
                    }
                }
            }
        }
        let doc: &Document = doc;
        let mut seen = HashSet::new();
        touched.retain(|node| seen.insert(*node) && has_protocol_text(doc, *node));
        touched
    }

    /// Text nodes already under `container` that carry protocol spans.
    pub fn scan(&self, doc: &Document, container: NodeId) -> Vec<NodeId> {
        doc.text_nodes(container)
            .into_iter()
            .filter(|node| has_protocol_text(doc, *node))
            .collect()
    }

    /// Remove every span from a text node. Returns how many were removed.
    ///
    /// Leaves the text alone in debug mode, and returns 0 without touching
    /// anything when a strip is already in progress.
    pub fn strip(&self, doc: &mut Document, node: NodeId) -> Result<usize, DomError> {
        if self.debug_mode {
            return Ok(0);
        }
        let Some(mut guard) = StripGuard::acquire(doc, &self.stripping, self.observers()) else {
            tracing::debug!(node = %node, "strip already in progress, skipping");
            return Ok(0);
        };
        let (stripped, removed) = match guard.kind(node) {
            Some(NodeKind::Text(text)) => strip_spans(text),
            _ => return Ok(0),
        };
        if removed > 0 {
            guard.set_text(node, &stripped)?;
        }
        Ok(removed)
    }

    fn prune(&mut self, doc: &mut Document) {
        let body = doc.body();
        self.observed.retain(|node, observer| {
            let alive = doc.contains(*node) && doc.is_inclusive_descendant(*node, body);
            if !alive {
                tracing::debug!(node = %node, "output container gone, dropping observer");
                doc.unobserve(*observer);
            }
            alive
        });
    }
}

fn has_protocol_text(doc: &Document, node: NodeId) -> bool {
    matches!(doc.kind(node), Some(NodeKind::Text(text)) if contains_prefix(text))
}
