//! The markup writer.
//!
//! Depth-first over the tree with an explicit stack of open elements. Text
//! escapes `&`, `<`, `>` and carriage return; attribute
//! values additionally escape both quotes and the whitespace characters so
//! that they survive attribute-value normalization on the way back in.
//! Comment, processing-instruction and CDATA payloads are written as they
//! are. Every character outside the XML `Char` production becomes U+FFFD.

use std::fmt::{self, Write};

use super::SerializeOptions;
use crate::tree::{Dom, NodeId, NodeKind};

/// Writes `id` and its subtree to `out`.
///
/// # Errors
///
/// Returns any error raised by `out`.
pub fn write_node<W: Write>(
    dom: &Dom,
    id: NodeId,
    out: &mut W,
    options: &SerializeOptions,
) -> fmt::Result {
    // Containers whose end tag is still owed, innermost last.
    let mut open: Vec<NodeId> = Vec::new();
    let mut current = Some(id);
    while let Some(node) = current {
        if write_open(dom, node, out, options)? {
            if let Some(child) = dom.first_child(node) {
                open.push(node);
                current = Some(child);
                continue;
            }
            write_close(dom, node, out)?;
        }
        current = None;
        let mut finished = node;
        while finished != id {
            if let Some(next) = dom.next_sibling(finished) {
                current = Some(next);
                break;
            }
            let Some(parent) = open.pop() else { break };
            write_close(dom, parent, out)?;
            finished = parent;
        }
    }
    Ok(())
}

/// Writes everything up to a node's children. Returns whether a matching
/// [`write_close`] is owed.
fn write_open<W: Write>(
    dom: &Dom,
    id: NodeId,
    out: &mut W,
    options: &SerializeOptions,
) -> Result<bool, fmt::Error> {
    match dom.kind(id) {
        NodeKind::Document {
            version,
            encoding,
            standalone,
        } => {
            if options.xml_declaration {
                write!(out, "<?xml version=\"{}\"", version.as_deref().unwrap_or("1.0"))?;
                if let Some(encoding) = encoding {
                    write!(out, " encoding=\"{encoding}\"")?;
                }
                if let Some(standalone) = standalone {
                    let flag = if *standalone { "yes" } else { "no" };
                    write!(out, " standalone=\"{flag}\"")?;
                }
                out.write_str("?>\n")?;
            }
            Ok(true)
        }
        NodeKind::DocumentFragment => Ok(true),
        NodeKind::Element { name, attributes } => {
            write!(out, "<{name}")?;
            for &attr in attributes.as_slice() {
                out.write_char(' ')?;
                write_open(dom, attr, out, options)?;
            }
            if options.self_closing && !dom.has_child_nodes(id) {
                out.write_str("/>")?;
                return Ok(false);
            }
            out.write_char('>')?;
            Ok(true)
        }
        NodeKind::Attribute { name, value, .. } => {
            write!(out, "{name}=\"")?;
            write_escaped_attr(out, value)?;
            out.write_char('"')?;
            Ok(false)
        }
        NodeKind::Text { content } => write_escaped_text(out, content).map(|()| false),
        NodeKind::CData { content } => {
            out.write_str("<![CDATA[")?;
            write_replacing_invalid(out, content)?;
            out.write_str("]]>")?;
            Ok(false)
        }
        NodeKind::Comment { content } => {
            out.write_str("<!--")?;
            write_replacing_invalid(out, content)?;
            out.write_str("-->")?;
            Ok(false)
        }
        NodeKind::ProcessingInstruction { target, data } => {
            write!(out, "<?{target}")?;
            if !data.is_empty() {
                out.write_char(' ')?;
                write_replacing_invalid(out, data)?;
            }
            out.write_str("?>")?;
            Ok(false)
        }
        NodeKind::DocumentType {
            name,
            public_id,
            system_id,
            internal_subset,
        } => {
            write!(out, "<!DOCTYPE {name}")?;
            match (public_id, system_id) {
                (Some(public), Some(system)) => write!(out, " PUBLIC \"{public}\" \"{system}\"")?,
                (Some(public), None) => write!(out, " PUBLIC \"{public}\"")?,
                (None, Some(system)) => write!(out, " SYSTEM \"{system}\"")?,
                (None, None) => {}
            }
            if let Some(subset) = internal_subset {
                write!(out, " [{subset}]")?;
            }
            out.write_char('>')?;
            Ok(false)
        }
    }
}

fn write_close<W: Write>(dom: &Dom, id: NodeId, out: &mut W) -> fmt::Result {
    match dom.kind(id) {
        NodeKind::Element { name, .. } => write!(out, "</{name}>"),
        _ => Ok(()),
    }
}

/// The `Char` production of XML 1.0. Rust strings cannot hold surrogates.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{FFFD}' | '\u{10000}'..)
}

fn write_escaped_text<W: Write>(out: &mut W, text: &str) -> fmt::Result {
    write_escaped(out, text, |c| match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '\r' => Some("&#xD;"),
        _ => None,
    })
}

fn write_escaped_attr<W: Write>(out: &mut W, text: &str) -> fmt::Result {
    write_escaped(out, text, |c| match c {
        '"' => Some("&#34;"),
        '\'' => Some("&#39;"),
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '\t' => Some("&#x9;"),
        '\n' => Some("&#xA;"),
        '\r' => Some("&#xD;"),
        _ => None,
    })
}

fn write_replacing_invalid<W: Write>(out: &mut W, text: &str) -> fmt::Result {
    write_escaped(out, text, |_| None)
}

/// Copies `text` to `out`, substituting `escape(c)` where it returns a
/// replacement and U+FFFD for characters outside the `Char` production.
fn write_escaped<W, F>(out: &mut W, text: &str, escape: F) -> fmt::Result
where
    W: Write,
    F: Fn(char) -> Option<&'static str>,
{
    let mut last = 0;
    for (i, c) in text.char_indices() {
        let replacement = match escape(c) {
            Some(esc) => esc,
            None if is_xml_char(c) => continue,
            None => "\u{FFFD}",
        };
        out.write_str(&text[last..i])?;
        out.write_str(replacement)?;
        last = i + c.len_utf8();
    }
    out.write_str(&text[last..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::{serialize, serialize_with_options};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_element_uses_end_tag_by_default() {
        let mut dom = Dom::new();
        let doc = dom.parse_str("<root><el a1=\"val\"/></root>").unwrap();
        assert_eq!(serialize(&dom, doc), r#"<root><el a1="val"></el></root>"#);
        let opts = SerializeOptions::default().self_closing(true);
        assert_eq!(
            serialize_with_options(&dom, doc, &opts),
            r#"<root><el a1="val"/></root>"#
        );
    }

    #[test]
    fn test_text_escaping() {
        let mut dom = Dom::new();
        let doc = dom.create_document();
        let text = dom.create_text_node(doc, "a < b & c > d \"q\" 'a'\t\n");
        assert_eq!(
            serialize(&dom, text),
            "a &lt; b &amp; c &gt; d \"q\" 'a'\t\n"
        );
    }

    #[test]
    fn test_text_carriage_return_is_escaped() {
        let mut dom = Dom::new();
        let doc = dom.create_document();
        let text = dom.create_text_node(doc, "a\r\nb\r");
        assert_eq!(serialize(&dom, text), "a&#xD;\nb&#xD;");
    }

    #[test]
    fn test_attribute_escaping() {
        let mut dom = Dom::new();
        let doc = dom.create_document();
        let el = dom.create_element(doc, "e");
        dom.set_attribute(el, "v", "\"'&<>\t\n\r").unwrap();
        assert_eq!(
            serialize(&dom, el),
            r#"<e v="&#34;&#39;&amp;&lt;&gt;&#x9;&#xA;&#xD;"></e>"#
        );
        let attr = dom.get_attribute_node(el, "v").unwrap();
        dom.set_value(attr, "x");
        assert_eq!(serialize(&dom, attr), r#"v="x""#);
    }

    #[test]
    fn test_invalid_characters_are_replaced() {
        let mut dom = Dom::new();
        let doc = dom.create_document();
        let text = dom.create_text_node(doc, "a\u{1}b\u{FFFE}");
        assert_eq!(serialize(&dom, text), "a\u{FFFD}b\u{FFFD}");
        let comment = dom.create_comment(doc, "<&\u{0}>");
        assert_eq!(serialize(&dom, comment), "<!--<&\u{FFFD}>-->");
    }

    #[test]
    fn test_cdata_pi_and_comment_are_not_escaped() {
        let mut dom = Dom::new();
        let doc = dom.create_document();
        let cdata = dom.create_cdata_section(doc, "<b>&</b>");
        let pi = dom.create_processing_instruction(doc, "style", "a<b");
        let bare = dom.create_processing_instruction(doc, "empty", "");
        assert_eq!(serialize(&dom, cdata), "<![CDATA[<b>&</b>]]>");
        assert_eq!(serialize(&dom, pi), "<?style a<b?>");
        assert_eq!(serialize(&dom, bare), "<?empty?>");
    }

    #[test]
    fn test_doctype_forms() {
        let mut dom = Dom::new();
        let doc = dom.create_document();
        let plain = dom.create_document_type(doc, "html", None, None);
        let system = dom.create_document_type(doc, "html", None, Some("s.dtd"));
        let public = dom.create_document_type(doc, "html", Some("-//P"), Some("s.dtd"));
        let subset =
            dom.create_document_type_with_subset(doc, "note", None, None, Some(" <!ELEMENT note ANY> "));
        assert_eq!(serialize(&dom, plain), "<!DOCTYPE html>");
        assert_eq!(serialize(&dom, system), r#"<!DOCTYPE html SYSTEM "s.dtd">"#);
        assert_eq!(
            serialize(&dom, public),
            r#"<!DOCTYPE html PUBLIC "-//P" "s.dtd">"#
        );
        assert_eq!(
            serialize(&dom, subset),
            "<!DOCTYPE note [ <!ELEMENT note ANY> ]>"
        );
    }

    #[test]
    fn test_xml_declaration_uses_document_metadata() {
        let mut dom = Dom::new();
        let doc = dom
            .parse_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?><r/>"#)
            .unwrap();
        assert_eq!(serialize(&dom, doc), "<r></r>");
        let opts = SerializeOptions::default().xml_declaration(true);
        assert_eq!(
            serialize_with_options(&dom, doc, &opts),
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n<r></r>"
        );
    }

    #[test]
    fn test_fragment_and_subtree() {
        let mut dom = Dom::new();
        let doc = dom.create_document();
        let frag = dom.create_document_fragment(doc);
        let a = dom.create_element(doc, "a");
        let t = dom.create_text_node(doc, "x");
        dom.append(frag, &[a, t]).unwrap();
        assert_eq!(serialize(&dom, frag), "<a></a>x");
        assert_eq!(serialize(&dom, a), "<a></a>");
    }

    #[test]
    fn test_prefixed_names_round_trip() {
        let mut dom = Dom::new();
        let text = r#"<h:note xmlns:h="http://x"><h:to>Tove</h:to></h:note>"#;
        let doc = dom.parse_str(text).unwrap();
        assert_eq!(serialize(&dom, doc), text);
    }

    #[test]
    fn test_subtree_stops_at_its_root() {
        let mut dom = Dom::new();
        let doc = dom.parse_str("<r><a><b/>t</a><c/></r>").unwrap();
        let r = dom.document_element(doc).unwrap();
        let a = dom.first_child(r).unwrap();
        assert_eq!(serialize(&dom, a), "<a><b></b>t</a>");
        let b = dom.first_child(a).unwrap();
        assert_eq!(serialize(&dom, b), "<b></b>");
    }

    #[test]
    fn test_very_deep_tree_serializes() {
        let mut dom = Dom::new();
        let doc = dom.create_document();
        // Built leaf first so each insertion stays O(1).
        let mut top = dom.create_element(doc, "d");
        for _ in 0..100_000 {
            let wrapper = dom.create_element(doc, "d");
            dom.append_child(wrapper, top).unwrap();
            top = wrapper;
        }
        dom.append_child(doc, top).unwrap();
        let out = serialize(&dom, doc);
        assert!(out.starts_with("<d><d><d>"));
        assert!(out.ends_with("</d></d></d>"));
        assert_eq!(out.len(), 100_001 * "<d></d>".len());
    }
}
