use std::collections::HashMap;
use std::fmt;

use crate::error::DomError;
use crate::utils::{escape_attr, escape_text};

const VOID_TAGS: &[&str] = &["br", "hr", "img", "col", "wbr", "input"];

/// Generational handle to a node. A removed node's id never resolves again,
/// so tables keyed by `NodeId` cannot keep host nodes alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    attrs: Vec<(String, String)>,
    style: Vec<(String, String)>,
    rect: Option<Rect>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element(Element),
    Text(String),
    /// Pre-serialized markup inserted as a unit (`innerHTML` of sanitized content).
    Html(String),
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    ChildList { added: Vec<NodeId>, removed: usize },
    CharacterData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub kind: MutationKind,
}

#[derive(Debug)]
struct Observer {
    target: NodeId,
    connected: bool,
    records: Vec<MutationRecord>,
}

/// In-memory host document: an arena tree with subtree mutation observers.
///
/// Observers queue records instead of calling back, so the host decides when
/// they are delivered (the way a browser delivers them after the current task).
#[derive(Debug)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    body: NodeId,
    observers: HashMap<ObserverId, Observer>,
    next_observer: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self {
            slots: Vec::new(),
            free: Vec::new(),
            body: NodeId {
                index: 0,
                generation: 0,
            },
            observers: HashMap::new(),
            next_observer: 1,
        };
        doc.body = doc.alloc(NodeKind::Element(Element {
            tag: "body".into(),
            ..Element::default()
        }));
        doc
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    /// Number of live nodes, body included.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Allocation ──────────────────────────────────────────────────────

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let node = Node {
            kind,
            parent: None,
            children: Vec::new(),
        };
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element(Element {
            tag: tag.to_ascii_lowercase(),
            ..Element::default()
        }))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    pub fn create_html(&mut self, markup: &str) -> NodeId {
        self.alloc(NodeKind::Html(markup.to_string()))
    }

    fn node(&self, id: NodeId) -> Result<&Node, DomError> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
            .ok_or(DomError::StaleNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, DomError> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
            .ok_or(DomError::StaleNode(id))
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element, DomError> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element(el) => Ok(el),
            _ => Err(DomError::NotAnElement(id)),
        }
    }

    // ── Tree structure ──────────────────────────────────────────────────

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).ok().map(|n| &n.kind)
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.kind(id)? {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).ok().and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// True when `id` is `ancestor` or lies beneath it.
    pub fn is_inclusive_descendant(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// Pre-order walk of `root`'s subtree, `root` included.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !self.contains(id) {
                continue;
            }
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    pub fn text_nodes(&self, root: NodeId) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|id| matches!(self.kind(*id), Some(NodeKind::Text(_))))
            .collect()
    }

    /// Append `child` under `parent`, moving it if it already has a parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.element_mut(parent)?;
        self.node(child)?;
        if self.is_inclusive_descendant(parent, child) {
            return Err(DomError::Cycle { parent, child });
        }
        self.detach(child)?;
        self.node_mut(child)?.parent = Some(parent);
        self.node_mut(parent)?.children.push(child);
        self.record(
            parent,
            MutationKind::ChildList {
                added: vec![child],
                removed: 0,
            },
        );
        Ok(())
    }

    fn detach(&mut self, id: NodeId) -> Result<(), DomError> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(());
        };
        if let Ok(p) = self.node_mut(parent) {
            p.children.retain(|c| *c != id);
        }
        self.node_mut(id)?.parent = None;
        self.record(
            parent,
            MutationKind::ChildList {
                added: Vec::new(),
                removed: 1,
            },
        );
        Ok(())
    }

    /// Detach `id` and free its whole subtree.
    pub fn remove(&mut self, id: NodeId) -> Result<(), DomError> {
        self.detach(id)?;
        for node in self.descendants(id) {
            self.free_slot(node);
        }
        Ok(())
    }

    /// Put `new` in `old`'s position and free `old`'s subtree.
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), DomError> {
        self.node(new)?;
        let Some(parent) = self.node(old)?.parent else {
            return self.remove(old);
        };
        if self.is_inclusive_descendant(parent, new) {
            return Err(DomError::Cycle { parent, child: new });
        }
        self.detach(new)?;
        let index = self
            .node(parent)?
            .children
            .iter()
            .position(|c| *c == old)
            .ok_or(DomError::StaleNode(old))?;
        self.node_mut(parent)?.children[index] = new;
        self.node_mut(new)?.parent = Some(parent);
        self.node_mut(old)?.parent = None;
        for node in self.descendants(old) {
            self.free_slot(node);
        }
        self.record(
            parent,
            MutationKind::ChildList {
                added: vec![new],
                removed: 1,
            },
        );
        Ok(())
    }

    fn free_slot(&mut self, id: NodeId) {
        if let Some(slot) = self.slots.get_mut(id.index as usize)
            && slot.generation == id.generation
            && slot.node.take().is_some()
        {
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(id.index);
        }
    }

    fn clear_children(&mut self, id: NodeId) -> Result<usize, DomError> {
        let children = std::mem::take(&mut self.node_mut(id)?.children);
        for child in &children {
            if let Ok(node) = self.node_mut(*child) {
                node.parent = None;
            }
            for node in self.descendants(*child) {
                self.free_slot(node);
            }
        }
        Ok(children.len())
    }

    // ── Text ────────────────────────────────────────────────────────────

    /// `textContent` getter. Raw markup nodes contribute their text with tags skipped.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            match self.kind(node) {
                Some(NodeKind::Text(text)) => out.push_str(text),
                Some(NodeKind::Html(markup)) => push_markup_text(&mut out, markup),
                _ => {}
            }
        }
        out
    }

    /// `textContent` setter: rewrites a text/markup node in place, or replaces
    /// an element's children with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) -> Result<(), DomError> {
        if let NodeKind::Text(data) | NodeKind::Html(data) = &mut self.node_mut(id)?.kind {
            if data.as_str() != text {
                *data = text.to_string();
                self.record(id, MutationKind::CharacterData);
            }
            return Ok(());
        }
        let removed = self.clear_children(id)?;
        let added = if text.is_empty() {
            Vec::new()
        } else {
            let child = self.create_text(text);
            self.node_mut(child)?.parent = Some(id);
            self.node_mut(id)?.children.push(child);
            vec![child]
        };
        self.record(id, MutationKind::ChildList { added, removed });
        Ok(())
    }

    // ── Attributes / style ──────────────────────────────────────────────

    /// Set an attribute. `style` is parsed into individual properties.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let name = name.to_ascii_lowercase();
        let el = self.element_mut(id)?;
        if name == "style" {
            el.style = parse_declarations(value);
            return Ok(());
        }
        upsert(&mut el.attrs, &name, value);
        Ok(())
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Result<(), DomError> {
        let el = self.element_mut(id)?;
        el.attrs.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        Ok(())
    }

    /// Attribute value. Inline styles are read with [`Document::style`].
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?
            .attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn set_style(&mut self, id: NodeId, prop: &str, value: &str) -> Result<(), DomError> {
        let el = self.element_mut(id)?;
        upsert(&mut el.style, &prop.to_ascii_lowercase(), value);
        Ok(())
    }

    pub fn remove_style(&mut self, id: NodeId, prop: &str) -> Result<(), DomError> {
        let el = self.element_mut(id)?;
        el.style.retain(|(k, _)| !k.eq_ignore_ascii_case(prop));
        Ok(())
    }

    pub fn style(&self, id: NodeId, prop: &str) -> Option<&str> {
        self.element(id)?
            .style
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(prop))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.attr(id, "class")
            .is_some_and(|c| c.split_ascii_whitespace().any(|token| token == class))
    }

    // ── Lookup ──────────────────────────────────────────────────────────

    pub fn get_element_by_id(&self, element_id: &str) -> Option<NodeId> {
        self.descendants(self.body)
            .into_iter()
            .find(|id| self.attr(*id, "id") == Some(element_id))
    }

    /// First element carrying `class`, in document order.
    pub fn find_by_class(&self, class: &str) -> Option<NodeId> {
        self.find_all_by_class(self.body, class).into_iter().next()
    }

    pub fn find_all_by_class(&self, root: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|id| self.has_class(*id, class))
            .collect()
    }

    // ── Layout boxes (host-provided geometry) ───────────────────────────

    pub fn rect(&self, id: NodeId) -> Option<Rect> {
        self.element(id)?.rect
    }

    pub fn set_rect(&mut self, id: NodeId, rect: Rect) -> Result<(), DomError> {
        self.element_mut(id)?.rect = Some(rect);
        Ok(())
    }

    // ── Serialization ───────────────────────────────────────────────────

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_html(*child, &mut out);
        }
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        match self.kind(id) {
            Some(NodeKind::Text(text)) => out.push_str(&escape_text(text)),
            Some(NodeKind::Html(markup)) => out.push_str(markup),
            Some(NodeKind::Element(el)) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attrs {
                    out.push_str(&format!(" {name}=\"{}\"", escape_attr(value)));
                }
                if !el.style.is_empty() {
                    let decls: Vec<String> =
                        el.style.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                    out.push_str(&format!(" style=\"{}\"", escape_attr(&decls.join("; "))));
                }
                out.push('>');
                if VOID_TAGS.contains(&el.tag.as_str()) {
                    return;
                }
                for child in self.children(id) {
                    self.write_html(*child, out);
                }
                out.push_str(&format!("</{}>", el.tag));
            }
            None => {}
        }
    }

    // ── Mutation observers ──────────────────────────────────────────────

    /// Observe child-list and character-data mutations in `target`'s subtree.
    pub fn observe(&mut self, target: NodeId) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.insert(
            id,
            Observer {
                target,
                connected: true,
                records: Vec::new(),
            },
        );
        id
    }

    /// Stop delivery and drop queued records. The registration is kept for
    /// [`Document::reconnect`].
    pub fn disconnect(&mut self, id: ObserverId) {
        if let Some(observer) = self.observers.get_mut(&id) {
            observer.connected = false;
            observer.records.clear();
        }
    }

    pub fn reconnect(&mut self, id: ObserverId) {
        if let Some(observer) = self.observers.get_mut(&id) {
            observer.connected = true;
        }
    }

    pub fn unobserve(&mut self, id: ObserverId) {
        self.observers.remove(&id);
    }

    pub fn is_connected(&self, id: ObserverId) -> bool {
        self.observers.get(&id).is_some_and(|o| o.connected)
    }

    /// Registered observers that are currently connected.
    pub fn active_observers(&self) -> usize {
        self.observers.values().filter(|o| o.connected).count()
    }

    pub fn take_records(&mut self, id: ObserverId) -> Vec<MutationRecord> {
        self.observers
            .get_mut(&id)
            .map(|o| std::mem::take(&mut o.records))
            .unwrap_or_default()
    }

    pub fn has_pending_records(&self) -> bool {
        self.observers.values().any(|o| !o.records.is_empty())
    }

    fn record(&mut self, target: NodeId, kind: MutationKind) {
        let interested: Vec<ObserverId> = self
            .observers
            .iter()
            .filter(|(_, o)| o.connected && self.is_inclusive_descendant(target, o.target))
            .map(|(id, _)| *id)
            .collect();
        for id in interested {
            if let Some(observer) = self.observers.get_mut(&id) {
                observer.records.push(MutationRecord {
                    target,
                    kind: kind.clone(),
                });
            }
        }
    }
}

fn upsert(entries: &mut Vec<(String, String)>, key: &str, value: &str) {
    if let Some(entry) = entries.iter_mut().find(|(k, _)| k == key) {
        entry.1 = value.to_string();
    } else {
        entries.push((key.to_string(), value.to_string()));
    }
}

fn parse_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim().to_ascii_lowercase();
            let value = value.trim();
            (!prop.is_empty() && !value.is_empty()).then(|| (prop, value.to_string()))
        })
        .collect()
}

fn push_markup_text(out: &mut String, markup: &str) {
    let mut in_tag = false;
    for c in markup.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
}
