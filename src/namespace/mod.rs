//! Namespace resolution.
//!
//! Three pieces share this module:
//!
//! - [`scope`]: the scope chain the builder uses while reading markup.
//! - Run-time lookup (`lookup_namespace_uri`, `lookup_prefix`,
//!   `is_default_namespace`): a pure function of the live tree, walking
//!   ancestor elements and their `xmlns` attributes.
//! - [`normalize`]: a mutating pass that adds the declarations and prefixes
//!   needed for the tree to serialize with correct namespaces.

pub(crate) mod normalize;
pub(crate) mod scope;

use crate::tree::{Dom, NodeId, NodeKind};

/// The namespace bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// The namespace of `xmlns` and `xmlns:*` declaration attributes.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

impl Dom {
    /// The element whose scope applies to `node`.
    fn namespace_context(&self, node: NodeId) -> Option<NodeId> {
        match self.kind(node) {
            NodeKind::Element { .. } => Some(node),
            NodeKind::Document { .. } => self.document_element(node),
            NodeKind::DocumentType { .. } | NodeKind::DocumentFragment => None,
            NodeKind::Attribute { owner_element, .. } => *owner_element,
            _ => self.parent_element(node),
        }
    }

    /// Finds the namespace URI bound to `prefix` (the default namespace for
    /// `None` or `""`) in scope at `node`.
    ///
    /// # Examples
    ///
    /// ```
    /// use xmldom::Dom;
    ///
    /// let mut dom = Dom::new();
    /// let doc = dom.parse_str(r#"<a xmlns:h="http://h"><b/></a>"#).unwrap();
    /// let a = dom.document_element(doc).unwrap();
    /// let b = dom.first_child(a).unwrap();
    /// assert_eq!(dom.lookup_namespace_uri(b, Some("h")), Some("http://h"));
    /// assert_eq!(dom.lookup_namespace_uri(b, None), None);
    /// ```
    #[must_use]
    pub fn lookup_namespace_uri(&self, node: NodeId, prefix: Option<&str>) -> Option<&str> {
        let prefix = prefix.filter(|p| !p.is_empty());
        match prefix {
            Some("xml") => return Some(XML_NAMESPACE),
            Some("xmlns") => return Some(XMLNS_NAMESPACE),
            _ => {}
        }

        let mut current = self.namespace_context(node);
        while let Some(element) = current {
            if let Some(name) = self.qname(element) {
                if name.namespace().is_some() && name.prefix() == prefix {
                    return name.namespace();
                }
            }
            for &attr in self.attributes(element) {
                let Some(name) = self.qname(attr) else {
                    continue;
                };
                if name.namespace() != Some(XMLNS_NAMESPACE) {
                    continue;
                }
                let declares = match prefix {
                    Some(p) => name.prefix() == Some("xmlns") && name.local() == p,
                    None => name.prefix().is_none() && name.local() == "xmlns",
                };
                if declares {
                    return self.value(attr).filter(|v| !v.is_empty());
                }
            }
            current = self.parent_element(element);
        }
        None
    }

    /// Finds a prefix bound to `namespace` in scope at `node`.
    #[must_use]
    pub fn lookup_prefix(&self, node: NodeId, namespace: &str) -> Option<&str> {
        if namespace.is_empty() {
            return None;
        }
        let mut current = self.namespace_context(node);
        while let Some(element) = current {
            if let Some(name) = self.qname(element) {
                if name.namespace() == Some(namespace) {
                    if let Some(prefix) = name.prefix() {
                        return Some(prefix);
                    }
                }
            }
            for &attr in self.attributes(element) {
                let Some(name) = self.qname(attr) else {
                    continue;
                };
                if name.namespace() == Some(XMLNS_NAMESPACE)
                    && name.prefix() == Some("xmlns")
                    && self.value(attr) == Some(namespace)
                {
                    return Some(name.local());
                }
            }
            current = self.parent_element(element);
        }
        None
    }

    /// Returns `true` if `namespace` is the default namespace at `node`.
    #[must_use]
    pub fn is_default_namespace(&self, node: NodeId, namespace: Option<&str>) -> bool {
        self.lookup_namespace_uri(node, None) == namespace.filter(|ns| !ns.is_empty())
    }
}
