//! Document creation, node factories, and adoption.
//!
//! Every factory takes the owning document (any node of that document is
//! accepted) and returns a detached node. Nodes start parentless and are
//! attached through the insertion operations.

use super::{Dom, NodeId, NodeKind};
use crate::error::DomError;
use crate::util::qname::QName;

impl Dom {
    /// Creates a new, empty document node.
    pub fn create_document(&mut self) -> NodeId {
        self.alloc(NodeKind::empty_document(), None)
    }

    fn create_owned(&mut self, doc: NodeId, kind: NodeKind) -> NodeId {
        let owner = self.document_of(doc);
        self.alloc(kind, Some(owner))
    }

    /// Creates an element with no namespace. A `prefix:local` name keeps its
    /// prefix; namespace normalization can resolve it later.
    pub fn create_element(&mut self, doc: NodeId, qualified: &str) -> NodeId {
        self.create_element_ns(doc, None, qualified)
    }

    /// Creates an element in `namespace`.
    pub fn create_element_ns(&mut self, doc: NodeId, namespace: Option<&str>, qualified: &str) -> NodeId {
        let name = QName::parse(self.dict_mut(), qualified, namespace);
        self.create_element_named(doc, name)
    }

    pub(crate) fn create_element_named(&mut self, doc: NodeId, name: QName) -> NodeId {
        self.create_owned(
            doc,
            NodeKind::Element {
                name,
                attributes: super::AttributeMap::default(),
            },
        )
    }

    /// Creates a detached attribute. `xmlns` and `xmlns:*` names are placed
    /// in the xmlns namespace; any other name has no namespace and is kept
    /// whole as the local name.
    pub fn create_attribute(&mut self, doc: NodeId, qualified: &str) -> NodeId {
        let name = self.plain_attribute_name(qualified);
        self.create_attribute_named(doc, name, String::new())
    }

    /// Creates a detached attribute in `namespace`.
    pub fn create_attribute_ns(&mut self, doc: NodeId, namespace: Option<&str>, qualified: &str) -> NodeId {
        let name = QName::parse(self.dict_mut(), qualified, namespace);
        self.create_attribute_named(doc, name, String::new())
    }

    pub(crate) fn create_attribute_named(&mut self, doc: NodeId, name: QName, value: String) -> NodeId {
        self.create_owned(
            doc,
            NodeKind::Attribute {
                name,
                value,
                owner_element: None,
            },
        )
    }

    /// Creates a text node.
    pub fn create_text_node(&mut self, doc: NodeId, data: &str) -> NodeId {
        self.create_owned(
            doc,
            NodeKind::Text {
                content: data.to_string(),
            },
        )
    }

    /// Creates a CDATA section.
    pub fn create_cdata_section(&mut self, doc: NodeId, data: &str) -> NodeId {
        self.create_owned(
            doc,
            NodeKind::CData {
                content: data.to_string(),
            },
        )
    }

    /// Creates a comment.
    pub fn create_comment(&mut self, doc: NodeId, data: &str) -> NodeId {
        self.create_owned(
            doc,
            NodeKind::Comment {
                content: data.to_string(),
            },
        )
    }

    /// Creates a processing instruction.
    pub fn create_processing_instruction(&mut self, doc: NodeId, target: &str, data: &str) -> NodeId {
        self.create_owned(
            doc,
            NodeKind::ProcessingInstruction {
                target: target.to_string(),
                data: data.to_string(),
            },
        )
    }

    /// Creates an empty document fragment.
    pub fn create_document_fragment(&mut self, doc: NodeId) -> NodeId {
        self.create_owned(doc, NodeKind::DocumentFragment)
    }

    /// Creates a document type without an internal subset.
    pub fn create_document_type(
        &mut self,
        doc: NodeId,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
    ) -> NodeId {
        self.create_document_type_with_subset(doc, name, public_id, system_id, None)
    }

    pub(crate) fn create_document_type_with_subset(
        &mut self,
        doc: NodeId,
        name: &str,
        public_id: Option<&str>,
        system_id: Option<&str>,
        internal_subset: Option<&str>,
    ) -> NodeId {
        self.create_owned(
            doc,
            NodeKind::DocumentType {
                name: name.to_string(),
                public_id: public_id.map(str::to_string),
                system_id: system_id.map(str::to_string),
                internal_subset: internal_subset.map(str::to_string),
            },
        )
    }

    // --- XML declaration metadata ---

    /// The XML version recorded from the XML declaration.
    #[must_use]
    pub fn xml_version(&self, doc: NodeId) -> Option<&str> {
        match self.kind(self.document_of(doc)) {
            NodeKind::Document { version, .. } => version.as_deref(),
            _ => None,
        }
    }

    /// The encoding recorded from the XML declaration.
    #[must_use]
    pub fn xml_encoding(&self, doc: NodeId) -> Option<&str> {
        match self.kind(self.document_of(doc)) {
            NodeKind::Document { encoding, .. } => encoding.as_deref(),
            _ => None,
        }
    }

    /// The standalone flag recorded from the XML declaration.
    #[must_use]
    pub fn xml_standalone(&self, doc: NodeId) -> Option<bool> {
        match self.kind(self.document_of(doc)) {
            NodeKind::Document { standalone, .. } => *standalone,
            _ => None,
        }
    }

    pub(crate) fn set_xml_declaration(
        &mut self,
        doc: NodeId,
        new_version: Option<String>,
        new_encoding: Option<String>,
        new_standalone: Option<bool>,
    ) {
        if let NodeKind::Document {
            version,
            encoding,
            standalone,
        } = &mut self.node_mut(doc).kind
        {
            *version = new_version;
            *encoding = new_encoding;
            *standalone = new_standalone;
        }
    }

    // --- Adoption ---

    /// Moves `node` (and its whole subtree, attributes included) into `doc`.
    ///
    /// The node is first detached from its parent, or removed from its owner
    /// element if it is an attribute.
    ///
    /// # Errors
    ///
    /// Returns `HierarchyRequest` if `node` is a document.
    pub fn adopt_node(&mut self, doc: NodeId, node: NodeId) -> Result<NodeId, DomError> {
        if matches!(self.kind(node), NodeKind::Document { .. }) {
            return Err(DomError::hierarchy("adopt_node", "a document cannot be adopted"));
        }
        let doc = self.document_of(doc);
        if let Some(element) = self.owner_element(node) {
            self.release_attribute(element, node);
        }
        self.unlink(node);

        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            self.node_mut(id).owner = Some(doc);
            stack.extend(self.attributes(id).iter().copied());
            stack.extend(self.children(id));
        }
        log::debug!(target: "xmldom::tree", "adopted {node:?} into {doc:?}");
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_factories_set_owner_and_leave_detached() {
        let mut dom = Dom::new();
        let doc = dom.create_document();
        let el = dom.create_element(doc, "e");
        let text = dom.create_text_node(el, "t");
        assert_eq!(dom.owner_document(el), Some(doc));
        assert_eq!(dom.owner_document(text), Some(doc));
        assert_eq!(dom.parent_node(el), None);
    }

    #[test]
    fn test_create_element_ns_and_prefix() {
        let mut dom = Dom::new();
        let doc = dom.create_document();
        let el = dom.create_element_ns(doc, Some("https://test.com/t"), "t:new");
        assert_eq!(dom.local_name(el), Some("new"));
        assert_eq!(dom.prefix(el), Some("t"));
        assert_eq!(dom.namespace_uri(el), Some("https://test.com/t"));
        assert_eq!(dom.tag_name(el).as_deref(), Some("t:new"));
    }

    #[test]
    fn test_adopt_moves_subtree_and_attributes() {
        let mut dom = Dom::new();
        let d1 = dom.create_document();
        let d2 = dom.create_document();
        let root = dom.create_element(d1, "root");
        dom.append_child(d1, root).unwrap();
        let child = dom.create_element(d1, "child");
        dom.append_child(root, child).unwrap();
        dom.set_attribute(child, "a", "1").unwrap();
        let attr = dom.get_attribute_node(child, "a").unwrap();

        dom.adopt_node(d2, root).unwrap();
        assert_eq!(dom.parent_node(root), None);
        assert_eq!(dom.first_child(d1), None);
        assert_eq!(dom.owner_document(root), Some(d2));
        assert_eq!(dom.owner_document(child), Some(d2));
        assert_eq!(dom.owner_document(attr), Some(d2));
        dom.append_child(d2, root).unwrap();
        assert_eq!(dom.document_element(d2), Some(root));
    }

    #[test]
    fn test_adopt_attribute_leaves_owner_element() {
        let mut dom = Dom::new();
        let d1 = dom.create_document();
        let d2 = dom.create_document();
        let el = dom.create_element(d1, "e");
        dom.set_attribute(el, "a", "1").unwrap();
        let attr = dom.get_attribute_node(el, "a").unwrap();
        dom.adopt_node(d2, attr).unwrap();
        assert_eq!(dom.owner_element(attr), None);
        assert!(dom.attributes(el).is_empty());
    }

    #[test]
    fn test_adopt_document_rejected() {
        let mut dom = Dom::new();
        let d1 = dom.create_document();
        let d2 = dom.create_document();
        let err = dom.adopt_node(d2, d1).unwrap_err();
        assert_eq!(err.kind, DomErrorKind::HierarchyRequest);
    }
}
