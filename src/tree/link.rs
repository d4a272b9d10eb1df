//! Circular child-list linkage.
//!
//! These are the unchecked primitives under every structural mutation. They
//! assume the caller has already validated the operation; the only
//! precondition they check (in debug builds) is that a node being linked is
//! detached.

use super::{Dom, NodeId};

/// Where to link a node relative to an anchor sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Position {
    /// Before the anchor; `Before(None)` appends.
    Before(Option<NodeId>),
}

impl Dom {
    /// Links a detached `child` into `parent`'s child list in O(1).
    #[allow(clippy::expect_used)]
    pub(crate) fn link(&mut self, parent: NodeId, child: NodeId, position: Position) {
        debug_assert!(
            self.node(child).parent.is_none(),
            "child already has a parent; unlink it first"
        );

        match self.node(parent).first_child {
            None => {
                let data = self.node_mut(child);
                data.next = Some(child);
                data.prev = Some(child);
                self.node_mut(parent).first_child = Some(child);
            }
            Some(first) => {
                let last = self.node(first).prev.expect("linked node has a prev link");
                let (prev, next, at_front) = match position {
                    Position::Before(None) => (last, first, false),
                    Position::Before(Some(anchor)) => {
                        let prev = self.node(anchor).prev.expect("anchor is linked");
                        (prev, anchor, anchor == first)
                    }
                };
                let data = self.node_mut(child);
                data.prev = Some(prev);
                data.next = Some(next);
                self.node_mut(prev).next = Some(child);
                self.node_mut(next).prev = Some(child);
                if at_front {
                    self.node_mut(parent).first_child = Some(child);
                }
            }
        }

        self.node_mut(child).parent = Some(parent);
        self.bump_version(parent);
        log::trace!(target: "xmldom::tree", "linked {child:?} under {parent:?}");
    }

    /// Unlinks `child` from its parent in O(1). No-op for a detached node.
    pub(crate) fn unlink(&mut self, child: NodeId) {
        let Some(parent) = self.node(child).parent else {
            return;
        };
        let next = self.node(child).next.unwrap_or(child);
        let prev = self.node(child).prev.unwrap_or(child);

        if next == child {
            self.node_mut(parent).first_child = None;
        } else {
            self.node_mut(prev).next = Some(next);
            self.node_mut(next).prev = Some(prev);
            if self.node(parent).first_child == Some(child) {
                self.node_mut(parent).first_child = Some(next);
            }
        }

        let data = self.node_mut(child);
        data.parent = None;
        data.next = None;
        data.prev = None;
        self.bump_version(parent);
        log::trace!(target: "xmldom::tree", "unlinked {child:?} from {parent:?}");
    }

    fn bump_version(&mut self, parent: NodeId) {
        let data = self.node_mut(parent);
        data.version = data.version.wrapping_add(1);
    }

    /// The version counter of a node's child sequence.
    pub(crate) fn child_version(&self, parent: NodeId) -> u64 {
        self.node(parent).version
    }

    /// Returns `true` if `ancestor` is `node` or one of its ancestors.
    #[must_use]
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }
}
