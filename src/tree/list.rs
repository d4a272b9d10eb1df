//! Live view over a node's children.

use super::{Dom, NodeId};

/// A live, index-addressable view of a node's children.
///
/// The view caches the child sequence together with the parent's version
/// counter. Every access compares the cached version with the live one and
/// rebuilds on mismatch, so the view always reflects the current tree while
/// repeated reads between mutations stay O(1).
///
/// # Examples
///
/// ```
/// use xmldom::Dom;
///
/// let mut dom = Dom::new();
/// let doc = dom.parse_str("<r><a/><b/></r>").unwrap();
/// let root = dom.document_element(doc).unwrap();
/// let mut list = dom.child_nodes(root);
/// assert_eq!(list.len(&dom), 2);
///
/// let a = list.item(&dom, 0).unwrap();
/// dom.remove_child(root, a).unwrap();
/// assert_eq!(list.len(&dom), 1);
/// ```
#[derive(Debug, Clone)]
pub struct NodeList {
    parent: NodeId,
    cache: Vec<NodeId>,
    version: Option<u64>,
}

impl NodeList {
    pub(crate) fn new(parent: NodeId) -> Self {
        Self {
            parent,
            cache: Vec::new(),
            version: None,
        }
    }

    /// The node whose children this list views.
    #[must_use]
    pub fn parent(&self) -> NodeId {
        self.parent
    }

    fn refresh(&mut self, dom: &Dom) {
        let live = dom.child_version(self.parent);
        if self.version != Some(live) {
            self.cache.clear();
            self.cache.extend(dom.children(self.parent));
            self.version = Some(live);
        }
    }

    /// Number of children.
    pub fn len(&mut self, dom: &Dom) -> usize {
        self.refresh(dom);
        self.cache.len()
    }

    /// Returns `true` if the parent has no children.
    pub fn is_empty(&mut self, dom: &Dom) -> bool {
        self.len(dom) == 0
    }

    /// The child at `index`, or `None` past the end.
    pub fn item(&mut self, dom: &Dom, index: usize) -> Option<NodeId> {
        self.refresh(dom);
        self.cache.get(index).copied()
    }

    /// Iterates the current children.
    pub fn iter(&mut self, dom: &Dom) -> std::iter::Copied<std::slice::Iter<'_, NodeId>> {
        self.refresh(dom);
        self.cache.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_list_tracks_insertions_and_removals() {
        let mut dom = Dom::new();
        let doc = dom.create_document();
        let root = dom.create_element(doc, "root");
        let mut list = dom.child_nodes(root);
        assert!(list.is_empty(&dom));

        let a = dom.create_element(doc, "a");
        let b = dom.create_element(doc, "b");
        dom.append_child(root, a).unwrap();
        dom.append_child(root, b).unwrap();
        assert_eq!(list.len(&dom), 2);
        assert_eq!(list.item(&dom, 1), Some(b));
        assert_eq!(list.item(&dom, 2), None);

        dom.remove_child(root, a).unwrap();
        assert_eq!(list.iter(&dom).collect::<Vec<_>>(), vec![b]);
        assert_eq!(list.parent(), root);
    }

    #[test]
    fn test_list_sees_reordering() {
        let mut dom = Dom::new();
        let doc = dom.create_document();
        let root = dom.create_element(doc, "root");
        let a = dom.create_element(doc, "a");
        let b = dom.create_element(doc, "b");
        dom.append_child(root, a).unwrap();
        dom.append_child(root, b).unwrap();
        let mut list = dom.child_nodes(root);
        assert_eq!(list.item(&dom, 0), Some(a));

        dom.insert_before(root, b, Some(a)).unwrap();
        assert_eq!(list.iter(&dom).collect::<Vec<_>>(), vec![b, a]);
    }
}
