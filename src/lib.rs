//! # xmldom
//!
//! A mutable, namespace-aware XML document object model.
//!
//! All nodes live in an arena ([`Dom`]) and are addressed by [`NodeId`].
//! Child lists are circular doubly linked lists, so insertion and removal
//! anywhere are O(1). Every structural mutation is checked against the
//! document hierarchy rules before it happens, and namespaces can be
//! resolved at any node or normalized across a subtree before
//! serialization.
//!
//! ## Quick Start
//!
//! ```
//! use xmldom::{serialize, Dom};
//!
//! let mut dom = Dom::new();
//! let doc = dom.parse_str(r#"<h:note xmlns:h="https://test.com/h"/>"#).unwrap();
//! let note = dom.document_element(doc).unwrap();
//!
//! let child = dom.create_element_ns(doc, Some("https://test.com/t"), "new");
//! dom.append_child(note, child).unwrap();
//! dom.normalize_namespaces(doc).unwrap();
//!
//! assert_eq!(
//!     serialize(&dom, doc),
//!     r#"<h:note xmlns:h="https://test.com/h"><ns0:new xmlns:ns0="https://test.com/t"></ns0:new></h:note>"#
//! );
//! ```

pub mod encoding;
pub mod error;
pub mod namespace;
pub mod parser;
pub mod serial;
pub mod tree;
pub mod util;

// Re-export primary types at the crate root for convenience.
pub use error::{DomError, DomErrorKind, SourceLocation};
pub use namespace::{XMLNS_NAMESPACE, XML_NAMESPACE};
pub use parser::{BuildOptions, TreeBuilder};
pub use serial::{serialize, serialize_with_options, SerializeOptions};
pub use tree::{AttributeMap, Dom, NodeId, NodeKind, NodeList, NodeType};
pub use util::qname::QName;
