//! Element attribute maps and attribute operations.
//!
//! Attributes are nodes in the arena. An element holds them in an
//! [`AttributeMap`]: an ordered list of attribute ids plus a hash index keyed
//! by the expanded `(namespace, local name)` pair, which is unique per element.

use std::collections::HashMap;
use std::sync::Arc;

use super::{Dom, NodeId, NodeKind};
use crate::error::DomError;
use crate::namespace::XMLNS_NAMESPACE;
use crate::util::qname::{split_qname, QName};

type AttrKey = (Option<Arc<str>>, Arc<str>);

fn key_of(name: &QName) -> AttrKey {
    (name.namespace_arc().cloned(), Arc::clone(name.local_arc()))
}

/// The attributes of one element, in insertion order, indexed by expanded
/// name.
#[derive(Debug, Clone, Default)]
pub struct AttributeMap {
    order: Vec<NodeId>,
    index: HashMap<AttrKey, NodeId>,
}

impl AttributeMap {
    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if there are no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Attribute ids in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[NodeId] {
        &self.order
    }

    /// The attribute at `index` in insertion order.
    #[must_use]
    pub fn item(&self, index: usize) -> Option<NodeId> {
        self.order.get(index).copied()
    }

    fn find(&self, key: &AttrKey) -> Option<NodeId> {
        self.index.get(key).copied()
    }

    fn push(&mut self, key: AttrKey, id: NodeId) {
        self.index.insert(key, id);
        self.order.push(id);
    }

    /// Swaps `new` into the slot held by `old`, keeping its position.
    fn replace(&mut self, key: AttrKey, old: NodeId, new: NodeId) {
        if let Some(slot) = self.order.iter_mut().find(|slot| **slot == old) {
            *slot = new;
        }
        self.index.insert(key, new);
    }

    fn remove(&mut self, key: &AttrKey) -> Option<NodeId> {
        let id = self.index.remove(key)?;
        self.order.retain(|&a| a != id);
        Some(id)
    }

    /// Re-indexes an attribute whose expanded name changed.
    fn rekey(&mut self, old: &AttrKey, new: AttrKey, id: NodeId) {
        self.index.remove(old);
        self.index.insert(new, id);
    }
}

impl Dom {
    /// Name for an attribute created without a namespace. `xmlns` and
    /// `xmlns:*` declarations belong to the xmlns namespace; any other name
    /// is kept whole as the local name, so `x:a` never shares a slot with `a`.
    pub(super) fn plain_attribute_name(&mut self, qualified: &str) -> QName {
        match split_qname(qualified) {
            (None, "xmlns") | (Some("xmlns"), _) => {
                QName::parse(self.dict_mut(), qualified, Some(XMLNS_NAMESPACE))
            }
            _ => QName::new(self.intern(qualified), None, None),
        }
    }

    fn attr_map(&self, element: NodeId) -> Option<&AttributeMap> {
        match self.kind(element) {
            NodeKind::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    fn attr_map_mut(&mut self, element: NodeId) -> Option<&mut AttributeMap> {
        match &mut self.node_mut(element).kind {
            NodeKind::Element { attributes, .. } => Some(attributes),
            _ => None,
        }
    }

    fn require_element(&self, element: NodeId, operation: &'static str) -> Result<(), DomError> {
        if self.attr_map(element).is_some() {
            Ok(())
        } else {
            Err(DomError::hierarchy(operation, "node is not an element"))
        }
    }

    fn attr_name(&self, attr: NodeId) -> Option<&QName> {
        match self.kind(attr) {
            NodeKind::Attribute { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Builds a lookup key from borrowed parts without interning. A part that
    /// was never interned cannot name an existing attribute.
    fn lookup_key(&self, namespace: Option<&str>, local: &str) -> Option<AttrKey> {
        let namespace = match namespace.filter(|ns| !ns.is_empty()) {
            Some(ns) => Some(self.dict().get(ns)?),
            None => None,
        };
        Some((namespace, self.dict().get(local)?))
    }

    /// Attribute ids of an element in insertion order; empty for other kinds.
    #[must_use]
    pub fn attributes(&self, element: NodeId) -> &[NodeId] {
        match self.attr_map(element) {
            Some(map) => map.as_slice(),
            None => &[],
        }
    }

    /// The attribute map of an element.
    #[must_use]
    pub fn attribute_map(&self, element: NodeId) -> Option<&AttributeMap> {
        self.attr_map(element)
    }

    /// The attribute at `index` in insertion order.
    #[must_use]
    pub fn attribute_item(&self, element: NodeId, index: usize) -> Option<NodeId> {
        self.attr_map(element).and_then(|m| m.item(index))
    }

    /// Finds an attribute node by qualified name.
    #[must_use]
    pub fn get_attribute_node(&self, element: NodeId, qualified: &str) -> Option<NodeId> {
        self.attributes(element)
            .iter()
            .copied()
            .find(|&a| self.attr_name(a).is_some_and(|n| n.matches_qualified(qualified)))
    }

    /// Returns an attribute value by qualified name.
    #[must_use]
    pub fn get_attribute(&self, element: NodeId, qualified: &str) -> Option<&str> {
        self.get_attribute_node(element, qualified)
            .and_then(|a| self.value(a))
    }

    /// Finds an attribute node by namespace and local name.
    #[must_use]
    pub fn get_attribute_node_ns(
        &self,
        element: NodeId,
        namespace: Option<&str>,
        local: &str,
    ) -> Option<NodeId> {
        let key = self.lookup_key(namespace, local)?;
        self.attr_map(element)?.find(&key)
    }

    /// Returns an attribute value by namespace and local name.
    #[must_use]
    pub fn get_attribute_ns(
        &self,
        element: NodeId,
        namespace: Option<&str>,
        local: &str,
    ) -> Option<&str> {
        self.get_attribute_node_ns(element, namespace, local)
            .and_then(|a| self.value(a))
    }

    /// Returns `true` if the element has an attribute with this qualified name.
    #[must_use]
    pub fn has_attribute(&self, element: NodeId, qualified: &str) -> bool {
        self.get_attribute_node(element, qualified).is_some()
    }

    /// Returns `true` if the element has an attribute with this expanded name.
    #[must_use]
    pub fn has_attribute_ns(&self, element: NodeId, namespace: Option<&str>, local: &str) -> bool {
        self.get_attribute_node_ns(element, namespace, local).is_some()
    }

    /// Qualified names of all attributes in insertion order.
    #[must_use]
    pub fn get_attribute_names(&self, element: NodeId) -> Vec<String> {
        self.attributes(element)
            .iter()
            .filter_map(|&a| self.attr_name(a).map(ToString::to_string))
            .collect()
    }

    /// Sets an attribute by qualified name.
    ///
    /// An existing attribute with the same qualified name has its value
    /// overwritten in place. Otherwise a new attribute with no namespace and
    /// the whole qualified name as its local name is appended. `xmlns` and
    /// `xmlns:*` names are placed in the xmlns namespace instead.
    ///
    /// # Errors
    ///
    /// Returns `HierarchyRequest` if `element` is not an element.
    pub fn set_attribute(&mut self, element: NodeId, qualified: &str, value: &str) -> Result<(), DomError> {
        self.require_element(element, "set_attribute")?;
        if let Some(existing) = self.get_attribute_node(element, qualified) {
            self.write_value(existing, value);
            return Ok(());
        }
        let name = self.plain_attribute_name(qualified);
        self.put_attribute(element, name, value);
        Ok(())
    }

    /// Sets an attribute by namespace and qualified name.
    ///
    /// An existing attribute with the same expanded name keeps its node,
    /// position, and prefix; only the value changes.
    ///
    /// # Errors
    ///
    /// Returns `HierarchyRequest` if `element` is not an element.
    pub fn set_attribute_ns(
        &mut self,
        element: NodeId,
        namespace: Option<&str>,
        qualified: &str,
        value: &str,
    ) -> Result<(), DomError> {
        self.require_element(element, "set_attribute_ns")?;
        let name = QName::parse(self.dict_mut(), qualified, namespace);
        self.put_attribute(element, name, value);
        Ok(())
    }

    /// Inserts or overwrites by expanded name.
    fn put_attribute(&mut self, element: NodeId, name: QName, value: &str) {
        let key = key_of(&name);
        let existing = self.attr_map(element).and_then(|m| m.find(&key));
        if let Some(existing) = existing {
            self.write_value(existing, value);
            return;
        }
        let owner = self.document_of(element);
        let attr = self.alloc(
            NodeKind::Attribute {
                name,
                value: value.to_string(),
                owner_element: Some(element),
            },
            Some(owner),
        );
        if let Some(map) = self.attr_map_mut(element) {
            map.push(key, attr);
        }
    }

    /// Attaches an attribute node to an element.
    ///
    /// If the element already has an attribute with the same expanded name,
    /// the new node takes its slot and the old node is released and returned.
    ///
    /// # Errors
    ///
    /// Returns `InUseAttribute` if `attr` belongs to another element, and
    /// `HierarchyRequest` if `element` is not an element or `attr` is not an
    /// attribute.
    ///
    /// # Panics
    ///
    /// Panics if `attr` belongs to a different document than `element`.
    pub fn set_attribute_node(&mut self, element: NodeId, attr: NodeId) -> Result<Option<NodeId>, DomError> {
        const OP: &str = "set_attribute_node";
        self.require_element(element, OP)?;
        assert_eq!(
            self.document_of(attr),
            self.document_of(element),
            "{OP}: attribute belongs to another document; adopt it first"
        );
        let (key, current_owner) = match self.kind(attr) {
            NodeKind::Attribute {
                name,
                owner_element,
                ..
            } => (key_of(name), *owner_element),
            _ => return Err(DomError::hierarchy(OP, "node is not an attribute")),
        };
        match current_owner {
            Some(owner) if owner == element => return Ok(None),
            Some(_) => {
                return Err(DomError::in_use_attribute(
                    OP,
                    "attribute is already owned by another element",
                ))
            }
            None => {}
        }

        let old = self.attr_map(element).and_then(|m| m.find(&key));
        if let Some(map) = self.attr_map_mut(element) {
            match old {
                Some(old) => map.replace(key, old, attr),
                None => map.push(key, attr),
            }
        }
        self.set_owner_element(attr, Some(element));
        if let Some(old) = old {
            self.set_owner_element(old, None);
        }
        Ok(old)
    }

    /// Removes an attribute by qualified name, returning the released node.
    pub fn remove_attribute(&mut self, element: NodeId, qualified: &str) -> Option<NodeId> {
        let attr = self.get_attribute_node(element, qualified)?;
        self.release_attribute(element, attr)
    }

    /// Removes an attribute by expanded name, returning the released node.
    pub fn remove_attribute_ns(&mut self, element: NodeId, namespace: Option<&str>, local: &str) -> Option<NodeId> {
        let attr = self.get_attribute_node_ns(element, namespace, local)?;
        self.release_attribute(element, attr)
    }

    /// Removes a specific attribute node from an element.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `attr` is not owned by `element`.
    pub fn remove_attribute_node(&mut self, element: NodeId, attr: NodeId) -> Result<NodeId, DomError> {
        if self.owner_element(attr) != Some(element) {
            return Err(DomError::not_found(
                "remove_attribute_node",
                "attribute is not owned by this element",
            ));
        }
        self.release_attribute(element, attr)
            .ok_or_else(|| DomError::not_found("remove_attribute_node", "attribute is not in the map"))
    }

    pub(crate) fn release_attribute(&mut self, element: NodeId, attr: NodeId) -> Option<NodeId> {
        let key = self.attr_name(attr).map(key_of)?;
        let removed = self.attr_map_mut(element)?.remove(&key)?;
        self.set_owner_element(removed, None);
        Some(removed)
    }

    fn set_owner_element(&mut self, attr: NodeId, element: Option<NodeId>) {
        if let NodeKind::Attribute { owner_element, .. } = &mut self.node_mut(attr).kind {
            *owner_element = element;
        }
    }

    fn write_value(&mut self, attr: NodeId, new_value: &str) {
        if let NodeKind::Attribute { value, .. } = &mut self.node_mut(attr).kind {
            new_value.clone_into(value);
        }
    }

    /// Renames an attribute in place, keeping its slot in the owner's map.
    ///
    /// # Errors
    ///
    /// Returns `Namespace` if the owner already has a different attribute
    /// with the new expanded name.
    pub(crate) fn rename_attribute(&mut self, attr: NodeId, name: QName) -> Result<(), DomError> {
        let Some(old_name) = self.attr_name(attr).cloned() else {
            return Ok(());
        };
        let (old_key, new_key) = (key_of(&old_name), key_of(&name));
        if let Some(element) = self.owner_element(attr) {
            if old_key != new_key {
                let clash = self.attr_map(element).and_then(|m| m.find(&new_key));
                if clash.is_some_and(|other| other != attr) {
                    return Err(DomError::namespace(
                        "normalize_namespaces",
                        format!("attribute '{name}' would duplicate an existing attribute"),
                    ));
                }
                if let Some(map) = self.attr_map_mut(element) {
                    map.rekey(&old_key, new_key, attr);
                }
            }
        }
        if let NodeKind::Attribute { name: slot, .. } = &mut self.node_mut(attr).kind {
            *slot = name;
        }
        Ok(())
    }

    /// Appends an attribute node owned by `element` without checks; used by
    /// cloning and namespace normalization.
    pub(crate) fn push_attribute(&mut self, element: NodeId, attr: NodeId) {
        let Some(key) = self.attr_name(attr).map(key_of) else {
            return;
        };
        if let Some(map) = self.attr_map_mut(element) {
            map.push(key, attr);
        }
        self.set_owner_element(attr, Some(element));
    }

    // --- Attribute node accessors ---

    /// The element that currently holds an attribute.
    #[must_use]
    pub fn owner_element(&self, attr: NodeId) -> Option<NodeId> {
        match self.kind(attr) {
            NodeKind::Attribute { owner_element, .. } => *owner_element,
            _ => None,
        }
    }

    /// The value of an attribute node.
    #[must_use]
    pub fn value(&self, attr: NodeId) -> Option<&str> {
        match self.kind(attr) {
            NodeKind::Attribute { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Replaces the value of an attribute node. No-op for other kinds.
    pub fn set_value(&mut self, attr: NodeId, value: &str) {
        self.write_value(attr, value);
    }

    /// The name of an attribute (qualified, e.g. `"xml:lang"`) or of a
    /// document type.
    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<String> {
        match self.kind(id) {
            NodeKind::Attribute { name, .. } => Some(name.to_string()),
            NodeKind::DocumentType { name, .. } => Some(name.clone()),
            _ => None,
        }
    }
}
