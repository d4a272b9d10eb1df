//! Namespace normalization.
//!
//! Walks a subtree in pre-order and makes every element and attribute name
//! consistent with the declarations in scope, adding `xmlns` attributes and
//! synthesized `ns<N>` prefixes where a namespace would otherwise be lost on
//! serialization. Running the pass again on its own output changes nothing.

use std::sync::Arc;

use super::scope::ScopeChain;
use super::XMLNS_NAMESPACE;
use crate::error::DomError;
use crate::tree::{Dom, NodeId, NodeKind, NodeType};
use crate::util::qname::QName;

const OP: &str = "normalize_namespaces";

impl Dom {
    /// Adds the namespace declarations and prefixes needed for `node`'s
    /// subtree to serialize with the namespaces its names carry.
    ///
    /// Declarations on ancestors of `node` are taken into account. Documents
    /// and fragments normalize each element child.
    ///
    /// # Errors
    ///
    /// Returns `Namespace` when a prefix is bound to a different namespace
    /// than the name carries, or when a prefixed name without a namespace
    /// has no binding in scope.
    ///
    /// # Examples
    ///
    /// ```
    /// use xmldom::{serialize, Dom};
    ///
    /// let mut dom = Dom::new();
    /// let doc = dom.parse_str(r#"<h:note xmlns:h="https://test.com/h"/>"#).unwrap();
    /// let root = dom.document_element(doc).unwrap();
    /// let child = dom.create_element_ns(doc, Some("https://test.com/t"), "new");
    /// dom.append_child(root, child).unwrap();
    ///
    /// dom.normalize_namespaces(doc).unwrap();
    /// assert_eq!(
    ///     serialize(&dom, child),
    ///     r#"<ns0:new xmlns:ns0="https://test.com/t"></ns0:new>"#
    /// );
    /// ```
    pub fn normalize_namespaces(&mut self, node: NodeId) -> Result<(), DomError> {
        let mut normalizer = Normalizer {
            scopes: ScopeChain::new(),
            counter: 0,
        };
        match self.node_type(node) {
            NodeType::Element => {
                let ancestors: Vec<NodeId> = self
                    .ancestors(node)
                    .skip(1)
                    .filter(|&a| matches!(self.kind(a), NodeKind::Element { .. }))
                    .collect();
                for &ancestor in ancestors.iter().rev() {
                    normalizer.scopes.push();
                    normalizer.declare_existing(self, ancestor);
                    normalizer.bind_own_prefix(self, ancestor);
                }
                normalizer.element(self, node)
            }
            NodeType::Document | NodeType::DocumentFragment => {
                let elements = element_children(self, node);
                for element in elements {
                    normalizer.element(self, element)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn element_children(dom: &Dom, parent: NodeId) -> Vec<NodeId> {
    dom.children(parent)
        .filter(|&c| matches!(dom.kind(c), NodeKind::Element { .. }))
        .collect()
}

struct Normalizer {
    scopes: ScopeChain,
    /// Next candidate for a synthesized `ns<N>` prefix.
    counter: usize,
}

enum Visit {
    Enter(NodeId),
    Leave,
}

impl Normalizer {
    /// Normalizes `root` and its element descendants in pre-order.
    fn element(&mut self, dom: &mut Dom, root: NodeId) -> Result<(), DomError> {
        let mut pending = vec![Visit::Enter(root)];
        while let Some(visit) = pending.pop() {
            let element = match visit {
                Visit::Enter(element) => element,
                Visit::Leave => {
                    self.scopes.pop();
                    continue;
                }
            };
            self.scopes.push();
            self.declare_existing(dom, element);
            self.fix_element(dom, element)?;
            let attributes = dom.attributes(element).to_vec();
            for attr in attributes {
                self.fix_attribute(dom, element, attr)?;
            }
            pending.push(Visit::Leave);
            pending.extend(element_children(dom, element).into_iter().rev().map(Visit::Enter));
        }
        Ok(())
    }

    /// Binds the `xmlns` / `xmlns:*` attributes already on `element`.
    fn declare_existing(&mut self, dom: &mut Dom, element: NodeId) {
        let mut declared = Vec::new();
        for &attr in dom.attributes(element) {
            let Some(name) = dom.qname(attr) else {
                continue;
            };
            if name.namespace() != Some(XMLNS_NAMESPACE) {
                continue;
            }
            let prefix = match name.prefix() {
                Some("xmlns") => Some(Arc::clone(name.local_arc())),
                None if name.local() == "xmlns" => None,
                _ => continue,
            };
            declared.push((prefix, dom.value(attr).unwrap_or_default().to_string()));
        }
        for (prefix, uri) in declared {
            let uri = dom.intern(&uri);
            self.scopes.bind(prefix, uri);
        }
    }

    /// Treats an ancestor's own prefix as bound, the way run-time lookup does.
    fn bind_own_prefix(&mut self, dom: &Dom, element: NodeId) {
        let Some(name) = dom.qname(element) else {
            return;
        };
        if let (Some(prefix), Some(ns)) = (name.prefix(), name.namespace_arc()) {
            if !self.scopes.is_bound(prefix) {
                let prefix = Arc::from(prefix);
                self.scopes.bind(Some(prefix), Arc::clone(ns));
            }
        }
    }

    fn fix_element(&mut self, dom: &mut Dom, element: NodeId) -> Result<(), DomError> {
        let Some(name) = dom.qname(element).cloned() else {
            return Ok(());
        };
        match (name.namespace_arc().cloned(), name.prefix()) {
            (Some(ns), None) => {
                if self.scopes.default_namespace() == Some(&ns) {
                    return Ok(());
                }
                let prefix = self.synthesize(dom);
                log::debug!(target: "xmldom::namespace", "prefixing <{name}> with {prefix}");
                set_element_name(dom, element, name.with_prefix(Some(Arc::clone(&prefix))));
                self.declare(dom, element, prefix, ns);
            }
            (Some(ns), Some(prefix)) => self.ensure_bound(dom, element, &name, prefix, ns)?,
            (None, Some(prefix)) => {
                let uri = self.resolve_unqualified(dom, &name, prefix)?;
                set_element_name(dom, element, name.with_namespace(Some(uri)));
            }
            (None, None) => {
                if self.scopes.default_namespace().is_some() {
                    self.undeclare_default(dom, element);
                }
            }
        }
        Ok(())
    }

    fn fix_attribute(&mut self, dom: &mut Dom, element: NodeId, attr: NodeId) -> Result<(), DomError> {
        let Some(name) = dom.qname(attr).cloned() else {
            return Ok(());
        };
        if name.namespace() == Some(XMLNS_NAMESPACE) {
            return Ok(());
        }
        match (name.namespace_arc().cloned(), name.prefix()) {
            (Some(ns), None) => {
                let prefix = match self.scopes.prefix_for(&ns).cloned() {
                    Some(prefix) => dom.intern(&prefix),
                    None => {
                        let prefix = self.synthesize(dom);
                        self.declare(dom, element, Arc::clone(&prefix), ns);
                        prefix
                    }
                };
                dom.rename_attribute(attr, name.with_prefix(Some(prefix)))?;
            }
            (Some(ns), Some(prefix)) => self.ensure_bound(dom, element, &name, prefix, ns)?,
            (None, Some(prefix)) => {
                let uri = self.resolve_unqualified(dom, &name, prefix)?;
                dom.rename_attribute(attr, name.with_namespace(Some(uri)))?;
            }
            (None, None) => {}
        }
        Ok(())
    }

    /// A prefixed, namespaced name: the prefix must resolve to the same
    /// namespace, or be declared here if unbound.
    fn ensure_bound(
        &mut self,
        dom: &mut Dom,
        element: NodeId,
        name: &QName,
        prefix: &str,
        ns: Arc<str>,
    ) -> Result<(), DomError> {
        match self.scopes.resolve(Some(prefix)) {
            Some(bound) if *bound == ns => Ok(()),
            Some(bound) => Err(DomError::namespace(
                OP,
                format!("prefix '{prefix}' of '{name}' is bound to '{bound}', not '{ns}'"),
            )),
            None if prefix == "xmlns" => Err(DomError::namespace(
                OP,
                format!("'{name}' uses the reserved prefix 'xmlns'"),
            )),
            None => {
                let prefix = dom.intern(prefix);
                self.declare(dom, element, prefix, ns);
                Ok(())
            }
        }
    }

    /// A prefixed name without a namespace adopts the one bound in scope.
    fn resolve_unqualified(&self, dom: &mut Dom, name: &QName, prefix: &str) -> Result<Arc<str>, DomError> {
        match self.scopes.resolve(Some(prefix)) {
            Some(uri) => Ok(dom.intern(uri)),
            None => Err(DomError::namespace(
                OP,
                format!("prefix '{prefix}' of '{name}' is not bound"),
            )),
        }
    }

    /// Picks the smallest unbound `ns<N>` at or above the running counter.
    fn synthesize(&mut self, dom: &mut Dom) -> Arc<str> {
        loop {
            let candidate = format!("ns{}", self.counter);
            self.counter += 1;
            if !self.scopes.is_bound(&candidate) {
                return dom.intern(&candidate);
            }
        }
    }

    /// Appends `xmlns:<prefix>="<ns>"` to `element` and records it in scope.
    fn declare(&mut self, dom: &mut Dom, element: NodeId, prefix: Arc<str>, ns: Arc<str>) {
        let xmlns = dom.intern("xmlns");
        let xmlns_ns = dom.intern(XMLNS_NAMESPACE);
        let name = QName::new(Arc::clone(&prefix), Some(xmlns), Some(xmlns_ns));
        let attr = dom.create_attribute_named(element, name, ns.to_string());
        dom.push_attribute(element, attr);
        log::debug!(target: "xmldom::namespace", "declared xmlns:{prefix}=\"{ns}\" on {element:?}");
        self.scopes.bind(Some(prefix), ns);
    }

    /// An element in no namespace under a default namespace needs
    /// `xmlns=""`.
    fn undeclare_default(&mut self, dom: &mut Dom, element: NodeId) {
        match dom.get_attribute_node_ns(element, Some(XMLNS_NAMESPACE), "xmlns") {
            Some(existing) => dom.set_value(existing, ""),
            None => {
                let xmlns = dom.intern("xmlns");
                let xmlns_ns = dom.intern(XMLNS_NAMESPACE);
                let name = QName::new(xmlns, None, Some(xmlns_ns));
                let attr = dom.create_attribute_named(element, name, String::new());
                dom.push_attribute(element, attr);
            }
        }
        self.scopes.bind(None, Arc::from(""));
    }
}

fn set_element_name(dom: &mut Dom, element: NodeId, new_name: QName) {
    if let NodeKind::Element { name, .. } = &mut dom.node_mut(element).kind {
        *name = new_name;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomErrorKind;
    use crate::serial::serialize;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_synthesized_prefix_for_unprefixed_child() {
        let mut dom = Dom::new();
        let doc = dom
            .parse_str(r#"<h:note xmlns:h="https://test.com/h"></h:note>"#)
            .unwrap();
        let root = dom.document_element(doc).unwrap();
        let child = dom.create_element_ns(doc, Some("https://test.com/t"), "new");
        dom.append_child(root, child).unwrap();

        dom.normalize_namespaces(doc).unwrap();
        assert_eq!(
            serialize(&dom, doc),
            r#"<h:note xmlns:h="https://test.com/h"><ns0:new xmlns:ns0="https://test.com/t"></ns0:new></h:note>"#
        );
    }

    #[test]
    fn test_default_namespace_match_needs_nothing() {
        let mut dom = Dom::new();
        let doc = dom.parse_str(r#"<r xmlns="http://d"></r>"#).unwrap();
        let root = dom.document_element(doc).unwrap();
        let child = dom.create_element_ns(doc, Some("http://d"), "c");
        dom.append_child(root, child).unwrap();
        dom.normalize_namespaces(doc).unwrap();
        assert_eq!(serialize(&dom, doc), r#"<r xmlns="http://d"><c></c></r>"#);
    }

    #[test]
    fn test_sibling_prefixes_do_not_collide() {
        let mut dom = Dom::new();
        let doc = dom.create_document();
        let root = dom.create_element(doc, "root");
        dom.append_child(doc, root).unwrap();
        let a = dom.create_element_ns(doc, Some("http://a"), "a");
        let b = dom.create_element_ns(doc, Some("http://b"), "b");
        dom.append(root, &[a, b]).unwrap();
        dom.normalize_namespaces(doc).unwrap();
        assert_eq!(dom.prefix(a), Some("ns0"));
        assert_eq!(dom.prefix(b), Some("ns1"));
    }

    #[test]
    fn test_existing_ns0_binding_is_skipped() {
        let mut dom = Dom::new();
        let doc = dom.parse_str(r#"<ns0:r xmlns:ns0="http://taken"></ns0:r>"#).unwrap();
        let root = dom.document_element(doc).unwrap();
        let child = dom.create_element_ns(doc, Some("http://new"), "c");
        dom.append_child(root, child).unwrap();
        dom.normalize_namespaces(doc).unwrap();
        assert_eq!(dom.prefix(child), Some("ns1"));
    }

    #[test]
    fn test_unbound_prefix_is_declared() {
        let mut dom = Dom::new();
        let doc = dom.create_document();
        let root = dom.create_element_ns(doc, Some("http://x"), "x:root");
        dom.append_child(doc, root).unwrap();
        dom.normalize_namespaces(doc).unwrap();
        assert_eq!(serialize(&dom, root), r#"<x:root xmlns:x="http://x"></x:root>"#);
    }

    #[test]
    fn test_conflicting_prefix_is_an_error() {
        let mut dom = Dom::new();
        let doc = dom.parse_str(r#"<x:root xmlns:x="http://one"></x:root>"#).unwrap();
        let root = dom.document_element(doc).unwrap();
        let child = dom.create_element_ns(doc, Some("http://two"), "x:child");
        dom.append_child(root, child).unwrap();
        let err = dom.normalize_namespaces(doc).unwrap_err();
        assert_eq!(err.kind, DomErrorKind::Namespace);
    }

    #[test]
    fn test_prefix_without_namespace_resolves_or_fails() {
        let mut dom = Dom::new();
        let doc = dom.parse_str(r#"<r xmlns:h="http://h"></r>"#).unwrap();
        let root = dom.document_element(doc).unwrap();
        let bound = dom.create_element(doc, "h:bound");
        dom.append_child(root, bound).unwrap();
        dom.normalize_namespaces(doc).unwrap();
        assert_eq!(dom.namespace_uri(bound), Some("http://h"));

        let unbound = dom.create_element(doc, "q:unbound");
        dom.append_child(root, unbound).unwrap();
        let err = dom.normalize_namespaces(doc).unwrap_err();
        assert_eq!(err.kind, DomErrorKind::Namespace);
    }

    #[test]
    fn test_namespaced_attribute_gets_prefix() {
        let mut dom = Dom::new();
        let doc = dom.create_document();
        let root = dom.create_element(doc, "root");
        dom.append_child(doc, root).unwrap();
        dom.set_attribute_ns(root, Some("http://a"), "a1", "v").unwrap();
        dom.normalize_namespaces(doc).unwrap();
        assert_eq!(
            serialize(&dom, root),
            r#"<root ns0:a1="v" xmlns:ns0="http://a"></root>"#
        );
        assert_eq!(dom.get_attribute_ns(root, Some("http://a"), "a1"), Some("v"));
    }

    #[test]
    fn test_no_namespace_child_under_default_gets_undeclared() {
        let mut dom = Dom::new();
        let doc = dom.parse_str(r#"<r xmlns="http://d"></r>"#).unwrap();
        let root = dom.document_element(doc).unwrap();
        let plain = dom.create_element(doc, "plain");
        dom.append_child(root, plain).unwrap();
        dom.normalize_namespaces(doc).unwrap();
        assert_eq!(serialize(&dom, plain), r#"<plain xmlns=""></plain>"#);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let mut dom = Dom::new();
        let doc = dom.parse_str(r#"<h:note xmlns:h="http://h"><x/></h:note>"#).unwrap();
        let root = dom.document_element(doc).unwrap();
        let a = dom.create_element_ns(doc, Some("http://a"), "a");
        dom.append_child(root, a).unwrap();
        dom.set_attribute_ns(a, Some("http://b"), "b", "1").unwrap();

        dom.normalize_namespaces(doc).unwrap();
        let once = serialize(&dom, doc);
        dom.normalize_namespaces(doc).unwrap();
        assert_eq!(serialize(&dom, doc), once);
    }

    #[test]
    fn test_subtree_sees_ancestor_declarations() {
        let mut dom = Dom::new();
        let doc = dom.parse_str(r#"<r xmlns:h="http://h"><c/></r>"#).unwrap();
        let root = dom.document_element(doc).unwrap();
        let c = dom.first_child(root).unwrap();
        let inner = dom.create_element_ns(doc, Some("http://h"), "h:inner");
        dom.append_child(c, inner).unwrap();
        dom.normalize_namespaces(c).unwrap();
        assert!(dom.attributes(inner).is_empty());
    }

    #[test]
    fn test_sibling_declarations_do_not_leak() {
        let mut dom = Dom::new();
        let doc = dom.parse_str(r#"<r><a xmlns:p="http://p"/><b/></r>"#).unwrap();
        let root = dom.document_element(doc).unwrap();
        let b = dom.last_child(root).unwrap();
        let inner = dom.create_element_ns(doc, Some("http://p"), "p:x");
        dom.append_child(b, inner).unwrap();
        dom.normalize_namespaces(doc).unwrap();
        assert_eq!(
            serialize(&dom, b),
            r#"<b><p:x xmlns:p="http://p"></p:x></b>"#
        );
    }
}
