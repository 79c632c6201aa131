use crate::dom::{Document, NodeId};
use crate::error::DomError;

/// Lightweight description of a widget's element tree.
///
/// Renderers produce a fresh `VNode` for every config; [`patch`] compares it
/// against the previous one and touches only the DOM nodes that differ.
#[derive(Debug, Clone, PartialEq)]
pub enum VNode {
    Element(VElement),
    Text(String),
    /// Sanitized markup inserted as one unit.
    Html(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VElement {
    pub tag: &'static str,
    pub attrs: Vec<(String, String)>,
    pub style: Vec<(String, String)>,
    pub children: Vec<VNode>,
}

pub fn el(tag: &'static str) -> VElement {
    VElement {
        tag,
        attrs: Vec::new(),
        style: Vec::new(),
        children: Vec::new(),
    }
}

impl VElement {
    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("class", class)
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.push((name.to_string(), value.into()));
        self
    }

    pub fn attr_opt(self, name: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.attr(name, value),
            None => self,
        }
    }

    pub fn style(mut self, prop: &str, value: impl Into<String>) -> Self {
        self.style.push((prop.to_string(), value.into()));
        self
    }

    pub fn style_opt(self, prop: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.style(prop, value),
            None => self,
        }
    }

    pub fn styles(mut self, decls: impl IntoIterator<Item = (String, String)>) -> Self {
        self.style.extend(decls);
        self
    }

    pub fn child(mut self, child: impl Into<VNode>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = VNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(VNode::Text(text.into()))
    }
}

impl From<VElement> for VNode {
    fn from(element: VElement) -> Self {
        Self::Element(element)
    }
}

/// Materialize `vnode` as a detached subtree.
pub fn build(doc: &mut Document, vnode: &VNode) -> Result<NodeId, DomError> {
    match vnode {
        VNode::Text(text) => Ok(doc.create_text(text)),
        VNode::Html(markup) => Ok(doc.create_html(markup)),
        VNode::Element(element) => {
            let node = doc.create_element(element.tag);
            for (name, value) in &element.attrs {
                doc.set_attr(node, name, value)?;
            }
            for (prop, value) in &element.style {
                doc.set_style(node, prop, value)?;
            }
            for child in &element.children {
                let child = build(doc, child)?;
                doc.append_child(node, child)?;
            }
            Ok(node)
        }
    }
}

/// Bring `node`, previously built from `old`, in line with `new`.
///
/// Returns the node now representing `new`: the same id unless the node kind
/// or tag changed and it had to be rebuilt in place.
pub fn patch(doc: &mut Document, node: NodeId, old: &VNode, new: &VNode) -> Result<NodeId, DomError> {
    match (old, new) {
        (VNode::Text(a), VNode::Text(b)) | (VNode::Html(a), VNode::Html(b)) => {
            if a != b {
                doc.set_text(node, b)?;
            }
            Ok(node)
        }
        (VNode::Element(a), VNode::Element(b)) if a.tag == b.tag => {
            patch_element(doc, node, a, b)?;
            Ok(node)
        }
        _ => {
            let fresh = build(doc, new)?;
            doc.replace(node, fresh)?;
            Ok(fresh)
        }
    }
}

fn patch_element(doc: &mut Document, node: NodeId, old: &VElement, new: &VElement) -> Result<(), DomError> {
    for (name, _) in &old.attrs {
        if !new.attrs.iter().any(|(n, _)| n == name) {
            doc.remove_attr(node, name)?;
        }
    }
    for (name, value) in &new.attrs {
        if !old.attrs.iter().any(|(n, v)| n == name && v == value) {
            doc.set_attr(node, name, value)?;
        }
    }
    for (prop, _) in &old.style {
        if !new.style.iter().any(|(p, _)| p == prop) {
            doc.remove_style(node, prop)?;
        }
    }
    for (prop, value) in &new.style {
        if !old.style.iter().any(|(p, v)| p == prop && v == value) {
            doc.set_style(node, prop, value)?;
        }
    }

    let current: Vec<NodeId> = doc.children(node).to_vec();
    let shared = old.children.len().min(new.children.len());
    for (index, (old_child, new_child)) in old.children.iter().zip(&new.children).enumerate() {
        let Some(&child) = current.get(index) else {
            break;
        };
        patch(doc, child, old_child, new_child)?;
    }
    for stale in current.iter().skip(shared) {
        doc.remove(*stale)?;
    }
    for extra in new.children.iter().skip(shared) {
        let child = build(doc, extra)?;
        doc.append_child(node, child)?;
    }
    Ok(())
}
