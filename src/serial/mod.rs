//! XML serialization.
//!
//! Writes any node (a whole document, an element subtree, a single text
//! node or attribute) back to markup text. Output is never indented, and
//! the XML declaration is only written when asked for.

pub mod xml;

use std::io;

use crate::tree::{Dom, NodeId};

/// Options controlling serialization output.
///
/// ```
/// use xmldom::serial::{serialize_with_options, SerializeOptions};
/// use xmldom::Dom;
///
/// let mut dom = Dom::new();
/// let doc = dom.parse_str("<root><empty></empty></root>").unwrap();
/// let opts = SerializeOptions::default().self_closing(true).xml_declaration(true);
/// assert_eq!(
///     serialize_with_options(&dom, doc, &opts),
///     "<?xml version=\"1.0\"?>\n<root><empty/></root>"
/// );
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Write childless elements as `<name/>`. Defaults to `false`, which
    /// always writes a start and end tag.
    pub self_closing: bool,
    /// Write an XML declaration before a document. Defaults to `false`.
    pub xml_declaration: bool,
}

impl SerializeOptions {
    /// Enables or disables `<name/>` for childless elements.
    #[must_use]
    pub fn self_closing(mut self, yes: bool) -> Self {
        self.self_closing = yes;
        self
    }

    /// Enables or disables the XML declaration.
    #[must_use]
    pub fn xml_declaration(mut self, yes: bool) -> Self {
        self.xml_declaration = yes;
        self
    }
}

/// Serializes `node` and its subtree to a string.
///
/// ```
/// use xmldom::{serialize, Dom};
///
/// let mut dom = Dom::new();
/// let doc = dom.parse_str(r#"<a x="1 &amp; 2">t &lt; u</a>"#).unwrap();
/// assert_eq!(serialize(&dom, doc), r#"<a x="1 &amp; 2">t &lt; u</a>"#);
/// ```
#[must_use]
pub fn serialize(dom: &Dom, node: NodeId) -> String {
    serialize_with_options(dom, node, &SerializeOptions::default())
}

/// Serializes `node` and its subtree to a string with the given options.
#[must_use]
pub fn serialize_with_options(dom: &Dom, node: NodeId, options: &SerializeOptions) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = xml::write_node(dom, node, &mut out, options);
    out
}

/// Serializes `node` and its subtree to an `io::Write` sink.
///
/// # Errors
///
/// Returns any I/O error raised by `writer`.
pub fn serialize_to_writer<W: io::Write>(
    dom: &Dom,
    node: NodeId,
    writer: W,
    options: &SerializeOptions,
) -> io::Result<()> {
    let mut adapter = IoAdapter {
        inner: writer,
        error: None,
    };
    match xml::write_node(dom, node, &mut adapter, options) {
        Ok(()) => adapter.inner.flush(),
        Err(_) => Err(adapter
            .error
            .unwrap_or_else(|| io::Error::other("formatter error"))),
    }
}

/// Bridges `fmt::Write` onto `io::Write`, keeping the first I/O error.
struct IoAdapter<W> {
    inner: W,
    error: Option<io::Error>,
}

impl<W: io::Write> std::fmt::Write for IoAdapter<W> {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        self.inner.write_all(s.as_bytes()).map_err(|e| {
            self.error = Some(e);
            std::fmt::Error
        })
    }
}
