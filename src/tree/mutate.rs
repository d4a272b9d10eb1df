//! Validated structural mutation, cloning, equality, and text normalization.

use super::validate::{check_pre_insert, check_replace};
use super::{Dom, NodeId, NodeKind, NodeType, Position};
use crate::error::DomError;

impl Dom {
    /// Appends `node` as the last child of `parent`, moving it if it is
    /// already in the tree. A fragment contributes its children instead.
    ///
    /// # Errors
    ///
    /// Returns `HierarchyRequest` if the insertion would violate the tree
    /// rules.
    ///
    /// # Panics
    ///
    /// Panics if `node` belongs to a different document; use
    /// [`adopt_node`](Dom::adopt_node) first.
    pub fn append_child(&mut self, parent: NodeId, node: NodeId) -> Result<NodeId, DomError> {
        self.pre_insert(parent, node, None, "append_child")
    }

    /// Inserts `node` before `reference` (or appends when `reference` is
    /// `None`), moving it if it is already in the tree.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `reference` is not a child of `parent`, and
    /// `HierarchyRequest` if the insertion would violate the tree rules.
    ///
    /// # Panics
    ///
    /// Panics if `node` or `reference` belongs to a different document.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<NodeId, DomError> {
        self.pre_insert(parent, node, reference, "insert_before")
    }

    fn pre_insert(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
        operation: &'static str,
    ) -> Result<NodeId, DomError> {
        check_pre_insert(self, parent, node, reference, operation)?;
        let reference = if reference == Some(node) {
            self.next_sibling(node)
        } else {
            reference
        };
        self.insert_unchecked(parent, node, reference);
        Ok(node)
    }

    /// Detaches `node` (or each child of a fragment, in order) and links it
    /// before `reference`.
    fn insert_unchecked(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>) {
        if matches!(self.kind(node), NodeKind::DocumentFragment) {
            let moved: Vec<NodeId> = self.children(node).collect();
            for child in moved {
                self.unlink(child);
                self.link(parent, child, Position::Before(reference));
            }
        } else {
            self.unlink(node);
            self.link(parent, node, Position::Before(reference));
        }
    }

    /// Removes `child` from `parent` and returns it. The node stays alive,
    /// detached.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `child` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        if self.parent_node(child) != Some(parent) {
            return Err(DomError::not_found(
                "remove_child",
                "the node is not a child of this parent",
            ));
        }
        self.unlink(child);
        Ok(child)
    }

    /// Replaces `child` of `parent` with `node` and returns the old child.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `child` is not a child of `parent`, and
    /// `HierarchyRequest` if the replacement would violate the tree rules.
    ///
    /// # Panics
    ///
    /// Panics if `node` or `child` belongs to a different document.
    pub fn replace_child(&mut self, parent: NodeId, node: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        check_replace(self, parent, node, child, "replace_child")?;
        if node == child {
            return Ok(child);
        }
        let mut reference = self.next_sibling(child);
        if reference == Some(node) {
            reference = self.next_sibling(node);
        }
        self.unlink(child);
        self.insert_unchecked(parent, node, reference);
        Ok(child)
    }

    /// Detaches a node from its parent. No-op for a detached node.
    pub fn remove(&mut self, node: NodeId) {
        self.unlink(node);
    }

    /// Appends several nodes to `parent` in order.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first insertion error; earlier nodes stay
    /// inserted.
    pub fn append(&mut self, parent: NodeId, nodes: &[NodeId]) -> Result<(), DomError> {
        for &node in nodes {
            self.pre_insert(parent, node, None, "append")?;
        }
        Ok(())
    }

    /// Inserts several nodes, in order, before the first child of `parent`.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first insertion error; earlier nodes stay
    /// inserted.
    pub fn prepend(&mut self, parent: NodeId, nodes: &[NodeId]) -> Result<(), DomError> {
        let mut anchor = self.first_child(parent);
        while anchor.is_some_and(|a| nodes.contains(&a)) {
            anchor = anchor.and_then(|a| self.next_sibling(a));
        }
        for &node in nodes {
            self.pre_insert(parent, node, anchor, "prepend")?;
        }
        Ok(())
    }

    // --- Text content ---

    /// Returns the DOM `textContent`: the concatenated Text and CDATA
    /// descendants of containers, the data of character-data nodes, or the
    /// value of an attribute. `None` for documents and document types.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> Option<String> {
        match self.kind(id) {
            NodeKind::Document { .. } | NodeKind::DocumentType { .. } => None,
            NodeKind::Element { .. } | NodeKind::DocumentFragment => {
                let mut buf = String::new();
                for d in self.descendants(id) {
                    if let NodeKind::Text { content } | NodeKind::CData { content } = self.kind(d) {
                        buf.push_str(content);
                    }
                }
                Some(buf)
            }
            _ => self.node_value(id).map(str::to_string),
        }
    }

    /// Sets the DOM `textContent`. Containers lose all their children and
    /// gain a single Text child when `text` is non-empty.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        match self.node_type(id) {
            NodeType::Document | NodeType::DocumentType => {}
            NodeType::Element | NodeType::DocumentFragment => {
                while let Some(child) = self.first_child(id) {
                    self.unlink(child);
                }
                if !text.is_empty() {
                    let node = self.create_text_node(id, text);
                    self.link(id, node, Position::Before(None));
                }
            }
            NodeType::Attribute => self.set_value(id, text),
            _ => {
                self.set_data(id, text);
            }
        }
    }

    /// Merges adjacent Text descendants and removes empty ones.
    pub fn normalize(&mut self, id: NodeId) {
        let mut containers = vec![id];
        while let Some(container) = containers.pop() {
            let mut child = self.first_child(container);
            while let Some(current) = child {
                let mut next = self.next_sibling(current);
                let empty_text = match &self.node(current).kind {
                    NodeKind::Text { content } => Some(content.is_empty()),
                    _ => None,
                };
                match empty_text {
                    Some(true) => self.unlink(current),
                    Some(false) => {
                        let mut merged = String::new();
                        while let Some(following) = next {
                            let NodeKind::Text { content } = &self.node(following).kind else {
                                break;
                            };
                            merged.push_str(content);
                            next = self.next_sibling(following);
                            self.unlink(following);
                        }
                        if let NodeKind::Text { content } = &mut self.node_mut(current).kind {
                            content.push_str(&merged);
                        }
                    }
                    None => containers.push(current),
                }
                child = next;
            }
        }
    }

    // --- Cloning and equality ---

    /// Copies a node. Attributes of an element are always copied; children
    /// only when `deep`. The copy has the same owner document and no parent.
    pub fn clone_node(&mut self, id: NodeId, deep: bool) -> NodeId {
        let owner = self.node(id).owner;
        let root = self.copy_one(id, owner);
        if !deep || matches!(self.kind(id), NodeKind::Attribute { .. }) {
            return root;
        }
        // A cloned document owns its cloned subtree.
        let child_owner = owner.or(Some(root));
        let mut pending = vec![(id, root)];
        while let Some((source, target)) = pending.pop() {
            let children: Vec<NodeId> = self.children(source).collect();
            for child in children {
                let copy = self.copy_one(child, child_owner);
                self.link(target, copy, Position::Before(None));
                pending.push((child, copy));
            }
        }
        root
    }

    /// Copies a single node and, for an element, its attributes.
    fn copy_one(&mut self, id: NodeId, owner: Option<NodeId>) -> NodeId {
        let kind = match &self.node(id).kind {
            NodeKind::Element { name, .. } => NodeKind::Element {
                name: name.clone(),
                attributes: super::AttributeMap::default(),
            },
            NodeKind::Attribute { name, value, .. } => NodeKind::Attribute {
                name: name.clone(),
                value: value.clone(),
                owner_element: None,
            },
            other => other.clone(),
        };
        let copy = self.alloc(kind, owner);
        let attributes = self.attributes(id).to_vec();
        for attr in attributes {
            let attr_copy = self.copy_one(attr, owner.or(Some(copy)));
            self.push_attribute(copy, attr_copy);
        }
        copy
    }

    /// DOM node equality: same kind, same kind-specific data, equal
    /// attribute sets (order-insensitive), and pairwise equal children.
    /// Document metadata and identity are ignored.
    #[must_use]
    pub fn is_equal_node(&self, a: NodeId, b: NodeId) -> bool {
        let mut pending = vec![(a, b)];
        while let Some((x, y)) = pending.pop() {
            if x == y {
                continue;
            }
            if !self.same_data(x, y) {
                return false;
            }
            let mut left = self.children(x);
            let mut right = self.children(y);
            loop {
                match (left.next(), right.next()) {
                    (None, None) => break,
                    (Some(l), Some(r)) => pending.push((l, r)),
                    _ => return false,
                }
            }
        }
        true
    }

    fn same_data(&self, a: NodeId, b: NodeId) -> bool {
        match (self.kind(a), self.kind(b)) {
            (NodeKind::Document { .. }, NodeKind::Document { .. })
            | (NodeKind::DocumentFragment, NodeKind::DocumentFragment) => true,
            (
                NodeKind::DocumentType {
                    name: n1,
                    public_id: p1,
                    system_id: s1,
                    internal_subset: i1,
                },
                NodeKind::DocumentType {
                    name: n2,
                    public_id: p2,
                    system_id: s2,
                    internal_subset: i2,
                },
            ) => n1 == n2 && p1 == p2 && s1 == s2 && i1 == i2,
            (NodeKind::Element { name: n1, .. }, NodeKind::Element { name: n2, .. }) => {
                n1 == n2 && self.same_attributes(a, b)
            }
            (
                NodeKind::Attribute {
                    name: n1, value: v1, ..
                },
                NodeKind::Attribute {
                    name: n2, value: v2, ..
                },
            ) => n1.same_expanded(n2) && v1 == v2,
            (
                NodeKind::ProcessingInstruction { target: t1, data: d1 },
                NodeKind::ProcessingInstruction { target: t2, data: d2 },
            ) => t1 == t2 && d1 == d2,
            (NodeKind::Text { content: c1 }, NodeKind::Text { content: c2 })
            | (NodeKind::CData { content: c1 }, NodeKind::CData { content: c2 })
            | (NodeKind::Comment { content: c1 }, NodeKind::Comment { content: c2 }) => c1 == c2,
            _ => false,
        }
    }

    fn same_attributes(&self, a: NodeId, b: NodeId) -> bool {
        let (left, right) = (self.attributes(a), self.attributes(b));
        left.len() == right.len()
            && left
                .iter()
                .all(|&x| right.iter().any(|&y| self.same_data(x, y)))
    }
}
