//! Character data, processing instruction, and document type accessors.

use super::{Dom, NodeId, NodeKind};

impl Dom {
    /// The data of a Text, CDATA, Comment, or PI node.
    #[must_use]
    pub fn data(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Text { content } | NodeKind::CData { content } | NodeKind::Comment { content } => {
                Some(content)
            }
            NodeKind::ProcessingInstruction { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Replaces the data of a Text, CDATA, Comment, or PI node. Returns
    /// `false` (and changes nothing) for other kinds.
    pub fn set_data(&mut self, id: NodeId, new_data: &str) -> bool {
        match &mut self.node_mut(id).kind {
            NodeKind::Text { content } | NodeKind::CData { content } | NodeKind::Comment { content } => {
                new_data.clone_into(content);
                true
            }
            NodeKind::ProcessingInstruction { data, .. } => {
                new_data.clone_into(data);
                true
            }
            _ => false,
        }
    }

    /// The target of a processing instruction.
    #[must_use]
    pub fn target(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::ProcessingInstruction { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Replaces the target of a processing instruction.
    pub fn set_target(&mut self, id: NodeId, new_target: &str) -> bool {
        match &mut self.node_mut(id).kind {
            NodeKind::ProcessingInstruction { target, .. } => {
                new_target.clone_into(target);
                true
            }
            _ => false,
        }
    }

    /// The PUBLIC identifier of a document type.
    #[must_use]
    pub fn public_id(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::DocumentType { public_id, .. } => public_id.as_deref(),
            _ => None,
        }
    }

    /// The SYSTEM identifier of a document type.
    #[must_use]
    pub fn system_id(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::DocumentType { system_id, .. } => system_id.as_deref(),
            _ => None,
        }
    }

    /// The internal subset of a document type, verbatim.
    #[must_use]
    pub fn definition(&self, id: NodeId) -> Option<&str> {
        match self.kind(id) {
            NodeKind::DocumentType {
                internal_subset, ..
            } => internal_subset.as_deref(),
            _ => None,
        }
    }
}
