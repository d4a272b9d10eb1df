//! Pre-insertion hierarchy checks.
//!
//! Nothing here mutates the tree. Every structural insertion runs one of
//! these checks first and only links the node when it passes.

use super::{Dom, NodeId, NodeKind};
use crate::error::DomError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mutation {
    /// Insert before `reference` (append when absent).
    Insert(Option<NodeId>),
    /// Replace `child`.
    Replace(NodeId),
}

impl Mutation {
    fn reference(self) -> Option<NodeId> {
        match self {
            Self::Insert(reference) => reference,
            Self::Replace(child) => Some(child),
        }
    }

    /// The existing child that will be gone after the mutation.
    fn replaced(self) -> Option<NodeId> {
        match self {
            Self::Insert(_) => None,
            Self::Replace(child) => Some(child),
        }
    }
}

/// Checks that `node` may be inserted into `parent` before `reference`.
///
/// # Panics
///
/// Panics if the nodes belong to different documents.
pub(crate) fn check_pre_insert(
    dom: &Dom,
    parent: NodeId,
    node: NodeId,
    reference: Option<NodeId>,
    operation: &'static str,
) -> Result<(), DomError> {
    ensure_valid(dom, parent, node, Mutation::Insert(reference), operation)
}

/// Checks that `child` of `parent` may be replaced with `node`.
///
/// # Panics
///
/// Panics if the nodes belong to different documents.
pub(crate) fn check_replace(
    dom: &Dom,
    parent: NodeId,
    node: NodeId,
    child: NodeId,
    operation: &'static str,
) -> Result<(), DomError> {
    ensure_valid(dom, parent, node, Mutation::Replace(child), operation)
}

fn ensure_valid(
    dom: &Dom,
    parent: NodeId,
    node: NodeId,
    mutation: Mutation,
    operation: &'static str,
) -> Result<(), DomError> {
    let doc = dom.document_of(parent);
    assert_eq!(
        dom.document_of(node),
        doc,
        "{operation}: node belongs to another document; adopt it first"
    );
    if let Some(reference) = mutation.reference() {
        assert_eq!(
            dom.document_of(reference),
            doc,
            "{operation}: reference node belongs to another document"
        );
    }

    let parent_kind = dom.kind(parent);
    if !matches!(
        parent_kind,
        NodeKind::Document { .. } | NodeKind::DocumentFragment | NodeKind::Element { .. }
    ) {
        return Err(DomError::hierarchy(
            operation,
            format!("{} nodes cannot have children", dom.node_name(parent)),
        ));
    }

    if dom.contains(node, parent) {
        return Err(DomError::hierarchy(
            operation,
            "the new child is an ancestor of the parent",
        ));
    }

    let node_kind = dom.kind(node);
    if matches!(
        node_kind,
        NodeKind::Document { .. } | NodeKind::Attribute { .. }
    ) {
        return Err(DomError::hierarchy(
            operation,
            format!("{} nodes cannot be inserted as children", dom.node_name(node)),
        ));
    }

    if let Some(reference) = mutation.reference() {
        if dom.parent_node(reference) != Some(parent) {
            return Err(DomError::not_found(
                operation,
                "the reference node is not a child of this parent",
            ));
        }
    }

    let is_doctype = matches!(node_kind, NodeKind::DocumentType { .. });
    let parent_is_document = matches!(parent_kind, NodeKind::Document { .. });
    if is_doctype && !parent_is_document {
        return Err(DomError::hierarchy(
            operation,
            "a document type may only appear under a document",
        ));
    }

    if parent_is_document {
        check_document_child(dom, parent, node, mutation, operation)?;
    }
    Ok(())
}

/// Cardinality and ordering rules for the direct children of a document.
fn check_document_child(
    dom: &Dom,
    doc: NodeId,
    node: NodeId,
    mutation: Mutation,
    operation: &'static str,
) -> Result<(), DomError> {
    let reference = mutation.reference();
    let replaced = mutation.replaced();
    let has_other = |pred: fn(&NodeKind) -> bool| {
        dom.children(doc)
            .any(|c| Some(c) != replaced && pred(dom.kind(c)))
    };

    match dom.kind(node) {
        NodeKind::Text { .. } | NodeKind::CData { .. } => Err(DomError::hierarchy(
            operation,
            "a document cannot contain character data",
        )),
        NodeKind::DocumentFragment => {
            let mut elements = 0;
            for child in dom.children(node) {
                match dom.kind(child) {
                    NodeKind::Element { .. } => elements += 1,
                    NodeKind::Text { .. } | NodeKind::CData { .. } => {
                        return Err(DomError::hierarchy(
                            operation,
                            "a document cannot contain character data",
                        ))
                    }
                    _ => {}
                }
            }
            if elements > 1 {
                return Err(DomError::hierarchy(
                    operation,
                    "a document can have only one element child",
                ));
            }
            if elements == 1 {
                check_element_slot(dom, reference, mutation, has_other(is_element), operation)?;
            }
            Ok(())
        }
        NodeKind::Element { .. } => {
            check_element_slot(dom, reference, mutation, has_other(is_element), operation)
        }
        NodeKind::DocumentType { .. } => {
            if has_other(is_doctype) {
                return Err(DomError::hierarchy(
                    operation,
                    "a document can have only one document type",
                ));
            }
            let element_before = match reference {
                Some(r) => preceding_siblings(dom, r).any(|s| is_element(dom.kind(s))),
                None => has_other(is_element),
            };
            if element_before {
                return Err(DomError::hierarchy(
                    operation,
                    "the document type must precede the document element",
                ));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn check_element_slot(
    dom: &Dom,
    reference: Option<NodeId>,
    mutation: Mutation,
    has_element: bool,
    operation: &'static str,
) -> Result<(), DomError> {
    if has_element {
        return Err(DomError::hierarchy(
            operation,
            "a document can have only one element child",
        ));
    }
    if let Some(r) = reference {
        if matches!(mutation, Mutation::Insert(_)) && is_doctype(dom.kind(r)) {
            return Err(DomError::hierarchy(
                operation,
                "the document element must follow the document type",
            ));
        }
        if following_siblings(dom, r).any(|s| is_doctype(dom.kind(s))) {
            return Err(DomError::hierarchy(
                operation,
                "the document element must follow the document type",
            ));
        }
    }
    Ok(())
}

fn is_element(kind: &NodeKind) -> bool {
    matches!(kind, NodeKind::Element { .. })
}

fn is_doctype(kind: &NodeKind) -> bool {
    matches!(kind, NodeKind::DocumentType { .. })
}

fn following_siblings(dom: &Dom, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    std::iter::successors(dom.next_sibling(node), move |&s| dom.next_sibling(s))
}

fn preceding_siblings(dom: &Dom, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
    std::iter::successors(dom.previous_sibling(node), move |&s| dom.previous_sibling(s))
}
