//! Arena-based mutable document tree.
//!
//! All nodes of any number of documents live in a contiguous `Vec<NodeData>`
//! owned by a [`Dom`], and are referenced by [`NodeId`], a newtype over
//! `NonZeroU32`. Every non-document node records its owner document; a
//! document node owns itself.
//!
//! # Architecture
//!
//! Each parent stores only its first child. Siblings form a circular doubly
//! linked list, so the last child is `first.prev` and both append and prepend
//! are O(1). The public navigation methods hide the circularity: the last
//! child has no next sibling and the first child has no previous sibling.
//!
//! Attribute nodes live in the same arena but are never linked into a child
//! list. They are reachable only through their owner element's
//! [`AttributeMap`].
//!
//! Node ids are never reused. A detached subtree stays valid until the `Dom`
//! is dropped.

mod attr;
mod chardata;
mod document;
mod link;
mod list;
mod mutate;
mod node;
mod validate;

pub use attr::AttributeMap;
pub use list::NodeList;
pub use node::{NodeKind, NodeType};

pub(crate) use link::Position;

use std::num::NonZeroU32;
use std::sync::Arc;

use crate::util::dict::Dict;
use crate::util::qname::QName;

/// Handle to a node in a [`Dom`].
///
/// Only meaningful for the arena that issued it. `Option<NodeId>` is four
/// bytes, which keeps the sibling links in [`NodeData`] compact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    // Slot 0 of the arena is a placeholder, so every real index is non-zero.
    #[allow(clippy::expect_used, clippy::cast_possible_truncation)]
    fn from_index(index: usize) -> Self {
        Self(NonZeroU32::new(index as u32).expect("arena slot 0 is reserved"))
    }

    fn as_index(self) -> usize {
        self.0.get() as usize
    }

    /// The raw arena slot, for embedding ids in external tables.
    #[must_use]
    pub fn into_raw(self) -> u32 {
        self.0.get()
    }

    /// Inverse of [`into_raw`](Self::into_raw); `None` for zero.
    #[must_use]
    pub fn from_raw(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }
}

/// Storage for a single node in the arena.
///
/// The kind payload is public for reading. Linkage fields are private to the
/// crate: all structural changes go through validated [`Dom`] operations.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// What kind of node this is and its payload.
    pub kind: NodeKind,
    /// Owning document. `None` only for document nodes.
    pub(crate) owner: Option<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    /// Next sibling in the circular list; the first child for the last one.
    pub(crate) next: Option<NodeId>,
    /// Previous sibling in the circular list; the last child for the first one.
    pub(crate) prev: Option<NodeId>,
    /// Bumped whenever the direct child sequence changes.
    pub(crate) version: u64,
}

impl NodeData {
    fn new(kind: NodeKind, owner: Option<NodeId>) -> Self {
        Self {
            kind,
            owner,
            parent: None,
            first_child: None,
            next: None,
            prev: None,
            version: 0,
        }
    }
}

/// A node arena holding one or more documents.
///
/// Navigation goes through `&Dom`, mutation through `&mut Dom`. Documents are
/// created with [`Dom::create_document`] or built from markup with
/// [`Dom::parse_str`].
///
/// # Examples
///
/// ```
/// use xmldom::Dom;
///
/// let mut dom = Dom::new();
/// let doc = dom.parse_str("<root><child/></root>").unwrap();
/// let root = dom.document_element(doc).unwrap();
/// assert_eq!(dom.node_name(root), "root");
/// assert_eq!(dom.children(root).count(), 1);
/// ```
#[derive(Debug)]
pub struct Dom {
    /// Slot 0 is a placeholder so ids can be `NonZeroU32`.
    nodes: Vec<NodeData>,
    /// Interned names, prefixes, and namespace URIs.
    dict: Dict,
}

impl Dom {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        let mut nodes = Vec::with_capacity(64);
        nodes.push(NodeData::new(NodeKind::DocumentFragment, None));
        Self {
            nodes,
            dict: Dict::new(),
        }
    }

    /// Raw storage for a node.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this arena.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.as_index()]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.as_index()]
    }

    /// Returns the kind payload of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub(crate) fn alloc(&mut self, kind: NodeKind, owner: Option<NodeId>) -> NodeId {
        let index = self.nodes.len();
        self.nodes.push(NodeData::new(kind, owner));
        NodeId::from_index(index)
    }

    pub(crate) fn dict(&self) -> &Dict {
        &self.dict
    }

    pub(crate) fn dict_mut(&mut self) -> &mut Dict {
        &mut self.dict
    }

    pub(crate) fn intern(&mut self, s: &str) -> Arc<str> {
        self.dict.intern(s)
    }

    /// Returns the total number of nodes ever allocated in the arena.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1
    }

    // --- Identity and kind ---

    /// Returns the DOM node type of a node.
    #[must_use]
    pub fn node_type(&self, id: NodeId) -> NodeType {
        self.kind(id).node_type()
    }

    /// Returns the DOM `nodeName`: the qualified name for elements and
    /// attributes, the target for PIs, the doctype name, or a `#`-prefixed
    /// constant for the other kinds.
    #[must_use]
    pub fn node_name(&self, id: NodeId) -> String {
        match self.kind(id) {
            NodeKind::Element { name, .. } | NodeKind::Attribute { name, .. } => name.to_string(),
            NodeKind::ProcessingInstruction { target, .. } => target.clone(),
            NodeKind::DocumentType { name, .. } => name.clone(),
            NodeKind::Text { .. } => "#text".to_string(),
            NodeKind::CData { .. } => "#cdata-section".to_string(),
            NodeKind::Comment { .. } => "#comment".to_string(),
            NodeKind::Document { .. } => "#document".to_string(),
            NodeKind::DocumentFragment => "#document-fragment".to_string(),
        }
    }

    /// Returns the DOM `nodeValue`: the data of character-data nodes and the
    /// value of attributes. `None` for the container kinds.
    #[must_use]
    pub fn node_value(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Text { content } | NodeKind::CData { content } | NodeKind::Comment { content } => {
                Some(content)
            }
            NodeKind::ProcessingInstruction { data, .. } => Some(data),
            NodeKind::Attribute { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Returns the qualified name of an element or attribute.
    #[must_use]
    pub fn qname(&self, id: NodeId) -> Option<&QName> {
        self.kind(id).qname()
    }

    /// Returns the qualified name of an element, e.g. `"h:table"`.
    #[must_use]
    pub fn tag_name(&self, id: NodeId) -> Option<String> {
        match self.kind(id) {
            NodeKind::Element { name, .. } => Some(name.to_string()),
            _ => None,
        }
    }

    /// Returns the local part of an element or attribute name.
    #[must_use]
    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        self.qname(id).map(QName::local)
    }

    /// Returns the prefix of an element or attribute name.
    #[must_use]
    pub fn prefix(&self, id: NodeId) -> Option<&str> {
        self.qname(id).and_then(QName::prefix)
    }

    /// Returns the namespace URI of an element or attribute.
    #[must_use]
    pub fn namespace_uri(&self, id: NodeId) -> Option<&str> {
        self.qname(id).and_then(QName::namespace)
    }

    /// Returns `true` if both ids name the same node.
    #[must_use]
    pub fn is_same_node(&self, a: NodeId, b: NodeId) -> bool {
        a == b
    }

    fn is_element(&self, id: NodeId) -> bool {
        matches!(self.kind(id), NodeKind::Element { .. })
    }

    // --- Ownership ---

    /// Returns the document that owns a node, or `None` for a document node.
    #[must_use]
    pub fn owner_document(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).owner
    }

    /// Returns the owning document, treating a document as its own owner.
    pub(crate) fn document_of(&self, id: NodeId) -> NodeId {
        self.node(id).owner.unwrap_or(id)
    }

    // --- Navigation ---

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent_node(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Returns the parent of a node if that parent is an element.
    #[must_use]
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent_node(id).filter(|&p| self.is_element(p))
    }

    /// Returns the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    /// Returns the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.first_child(id).and_then(|first| self.node(first).prev)
    }

    /// Returns the next sibling of a node, `None` for the last child.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.node(id).parent?;
        let next = self.node(id).next?;
        if Some(next) == self.node(parent).first_child {
            None
        } else {
            Some(next)
        }
    }

    /// Returns the previous sibling of a node, `None` for the first child.
    #[must_use]
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.node(id).parent?;
        if self.node(parent).first_child == Some(id) {
            None
        } else {
            self.node(id).prev
        }
    }

    /// Returns `true` if the node has at least one child.
    #[must_use]
    pub fn has_child_nodes(&self, id: NodeId) -> bool {
        self.node(id).first_child.is_some()
    }

    /// Returns the topmost inclusive ancestor of a node.
    #[must_use]
    pub fn root_node(&self, id: NodeId) -> NodeId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// Returns the first child that is an element.
    #[must_use]
    pub fn first_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).find(|&c| self.is_element(c))
    }

    /// Returns the last child that is an element.
    #[must_use]
    pub fn last_element_child(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.last_child(id);
        while let Some(c) = current {
            if self.is_element(c) {
                return Some(c);
            }
            current = self.previous_sibling(c);
        }
        None
    }

    /// Returns the next sibling that is an element.
    #[must_use]
    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.next_sibling(id);
        while let Some(c) = current {
            if self.is_element(c) {
                return Some(c);
            }
            current = self.next_sibling(c);
        }
        None
    }

    /// Returns the previous sibling that is an element.
    #[must_use]
    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.previous_sibling(id);
        while let Some(c) = current {
            if self.is_element(c) {
                return Some(c);
            }
            current = self.previous_sibling(c);
        }
        None
    }

    /// Returns the document element: the single element child of a document.
    #[must_use]
    pub fn document_element(&self, doc: NodeId) -> Option<NodeId> {
        self.first_element_child(self.document_of(doc))
    }

    /// Returns the document type child of a document.
    #[must_use]
    pub fn doctype(&self, doc: NodeId) -> Option<NodeId> {
        self.children(self.document_of(doc))
            .find(|&c| matches!(self.kind(c), NodeKind::DocumentType { .. }))
    }

    /// Returns an iterator over the children of a node.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            dom: self,
            next: self.node(id).first_child,
        }
    }

    /// Returns an iterator over a node and its ancestors (walking up to root).
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            dom: self,
            next: Some(id),
        }
    }

    /// Returns an iterator over all descendants of a node (depth-first,
    /// pre-order, excluding the node itself).
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            dom: self,
            root: id,
            next: self.first_child(id),
        }
    }

    /// Returns a live view over the children of `id`.
    #[must_use]
    pub fn child_nodes(&self, id: NodeId) -> NodeList {
        NodeList::new(id)
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

// --- Iterators ---

/// Iterator over the children of a node.
pub struct Children<'a> {
    dom: &'a Dom,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.dom.next_sibling(current);
        Some(current)
    }
}

/// Iterator over a node and its ancestors.
pub struct Ancestors<'a> {
    dom: &'a Dom,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.dom.parent_node(current);
        Some(current)
    }
}

/// Depth-first iterator over all descendants of a node.
pub struct Descendants<'a> {
    dom: &'a Dom,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        if let Some(child) = self.dom.first_child(current) {
            self.next = Some(child);
            return Some(current);
        }

        let mut node = current;
        loop {
            if node == self.root {
                self.next = None;
                break;
            }
            if let Some(sibling) = self.dom.next_sibling(node) {
                self.next = Some(sibling);
                break;
            }
            match self.dom.parent_node(node) {
                Some(parent) => node = parent,
                None => {
                    self.next = None;
                    break;
                }
            }
        }
        Some(current)
    }
}
