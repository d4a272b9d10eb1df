//! Node type definitions.
//!
//! The `NodeKind` enum is the closed set of node variants in a document
//! tree. Each variant carries its kind-specific payload (element name and
//! attributes, character data, doctype identifiers). Navigation links
//! (parent, children, siblings) and ownership are stored in `NodeData`, not
//! here.

use super::attr::AttributeMap;
use super::NodeId;
use crate::util::qname::QName;

/// The kind of a node and its associated data.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// A document node: the root of a tree. Never has a parent.
    Document {
        /// XML version from the XML declaration (e.g. `"1.0"`).
        version: Option<String>,
        /// Encoding from the XML declaration (e.g. `"UTF-8"`).
        encoding: Option<String>,
        /// Standalone flag from the XML declaration.
        standalone: Option<bool>,
    },

    /// An element node, e.g. `<h:note xmlns:h="...">`.
    Element {
        /// The element's qualified name.
        name: QName,
        /// Attribute nodes owned by this element, in document order.
        attributes: AttributeMap,
    },

    /// An attribute node. Attributes are never linked into a child list;
    /// they are reachable only through their owner element's map.
    Attribute {
        /// The attribute's qualified name.
        name: QName,
        /// The attribute value, with references already decoded.
        value: String,
        /// The element whose map currently holds this attribute.
        owner_element: Option<NodeId>,
    },

    /// A text node containing character data.
    Text {
        /// The decoded text.
        content: String,
    },

    /// A CDATA section, e.g. `<![CDATA[...]]>`.
    CData {
        /// The section content (no escaping applied).
        content: String,
    },

    /// A comment node, e.g. `<!-- ... -->`.
    Comment {
        /// The comment text without the delimiters.
        content: String,
    },

    /// A processing instruction, e.g. `<?target data?>`.
    ProcessingInstruction {
        /// The PI target.
        target: String,
        /// The PI data (may be empty).
        data: String,
    },

    /// A document type declaration, e.g. `<!DOCTYPE note [ ... ]>`.
    DocumentType {
        /// The root element name declared in the DOCTYPE.
        name: String,
        /// The PUBLIC identifier, if any.
        public_id: Option<String>,
        /// The SYSTEM identifier, if any.
        system_id: Option<String>,
        /// The internal subset, verbatim between `[` and `]`.
        internal_subset: Option<String>,
    },

    /// A document fragment: a parentless container whose children move into
    /// the insertion target.
    DocumentFragment,
}

/// DOM node type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum NodeType {
    Element = 1,
    Attribute = 2,
    Text = 3,
    CDataSection = 4,
    ProcessingInstruction = 7,
    Comment = 8,
    Document = 9,
    DocumentType = 10,
    DocumentFragment = 11,
}

impl NodeKind {
    /// Returns the DOM node type of this kind.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Document { .. } => NodeType::Document,
            Self::Element { .. } => NodeType::Element,
            Self::Attribute { .. } => NodeType::Attribute,
            Self::Text { .. } => NodeType::Text,
            Self::CData { .. } => NodeType::CDataSection,
            Self::Comment { .. } => NodeType::Comment,
            Self::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
            Self::DocumentType { .. } => NodeType::DocumentType,
            Self::DocumentFragment => NodeType::DocumentFragment,
        }
    }

    pub(crate) fn empty_document() -> Self {
        Self::Document {
            version: None,
            encoding: None,
            standalone: None,
        }
    }

    /// Returns `true` for Text and CDATA nodes.
    #[must_use]
    pub fn is_text_like(&self) -> bool {
        matches!(self, Self::Text { .. } | Self::CData { .. })
    }

    /// The qualified name of an element or attribute.
    #[must_use]
    pub fn qname(&self) -> Option<&QName> {
        match self {
            Self::Element { name, .. } | Self::Attribute { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl NodeType {
    /// Returns the numeric DOM `nodeType` value.
    #[must_use]
    pub fn code(self) -> u16 {
        self as u16
    }
}
