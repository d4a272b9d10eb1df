//! End-to-end behaviour: building from markup, editing, normalizing and
//! serializing back.

#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;

use xmldom::{serialize, Dom, DomErrorKind, NodeId, NodeType};

fn root_of(dom: &Dom, doc: NodeId) -> NodeId {
    dom.document_element(doc).unwrap()
}

/// Parses, serializes, re-parses and checks the second serialization is
/// identical to the first.
fn parse_and_roundtrip(dom: &mut Dom, input: &str) -> NodeId {
    let doc = dom
        .parse_str(input)
        .unwrap_or_else(|e| panic!("parse failed: {e}"));
    let first = serialize(dom, doc);
    let again = dom
        .parse_str(&first)
        .unwrap_or_else(|e| panic!("roundtrip parse failed: {e}"));
    assert_eq!(serialize(dom, again), first, "serialization is not stable");
    assert!(dom.is_equal_node(doc, again));
    doc
}

#[test]
fn test_attribute_of_empty_child() {
    let mut dom = Dom::new();
    let doc = dom.parse_str(r#"<root><el a1="val"/></root>"#).unwrap();
    let el = dom.first_element_child(root_of(&dom, doc)).unwrap();
    assert_eq!(dom.get_attribute(el, "a1"), Some("val"));
    assert!(dom.has_attribute(el, "a1"));
}

#[test]
fn test_prefixed_root_name_and_namespace() {
    let mut dom = Dom::new();
    let doc = dom
        .parse_str(r#"<h:note xmlns:h="http://x"><h:to>Tove</h:to></h:note>"#)
        .unwrap();
    let root = root_of(&dom, doc);
    assert_eq!(dom.tag_name(root).as_deref(), Some("h:note"));
    assert_eq!(dom.local_name(root), Some("note"));
    assert_eq!(dom.namespace_uri(root), Some("http://x"));
}

#[test]
fn test_normalize_synthesizes_prefix_for_new_child() {
    let mut dom = Dom::new();
    let doc = dom
        .parse_str(r#"<h:note xmlns:h="https://test.com/h"></h:note>"#)
        .unwrap();
    let root = root_of(&dom, doc);
    let child = dom.create_element_ns(doc, Some("https://test.com/t"), "new");
    dom.append_child(root, child).unwrap();
    dom.normalize_namespaces(doc).unwrap();

    let out = serialize(&dom, doc);
    assert!(out.contains(r#"<ns0:new xmlns:ns0="https://test.com/t">"#), "{out}");
    assert_eq!(dom.prefix(child), Some("ns0"));
}

#[test]
fn test_doctype_definition_is_verbatim() {
    let mut dom = Dom::new();
    let doc = dom
        .parse_str("<!DOCTYPE note [ <!ELEMENT note (to,from,heading,body)> ]><note/>")
        .unwrap();
    let dt = dom.doctype(doc).unwrap();
    assert_eq!(dom.node_type(dt), NodeType::DocumentType);
    assert_eq!(dom.node_name(dt), "note");
    assert_eq!(
        dom.definition(dt),
        Some(" <!ELEMENT note (to,from,heading,body)> ")
    );
    assert_eq!(
        serialize(&dom, doc),
        "<!DOCTYPE note [ <!ELEMENT note (to,from,heading,body)> ]><note></note>"
    );
}

#[test]
fn test_atom_feed_roundtrip() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example Feed</title>
  <link href="http://example.org/"/>
  <author>
    <name>John Doe</name>
  </author>
  <entry>
    <title>Atom-Powered Robots Run Amok</title>
    <summary>Some text &amp; more.</summary>
  </entry>
</feed>"#;
    let mut dom = Dom::new();
    let doc = parse_and_roundtrip(&mut dom, xml);
    let root = root_of(&dom, doc);
    assert_eq!(dom.namespace_uri(root), Some("http://www.w3.org/2005/Atom"));
    let title = dom.first_element_child(root).unwrap();
    assert_eq!(dom.namespace_uri(title), Some("http://www.w3.org/2005/Atom"));
    assert_eq!(dom.xml_encoding(doc), Some("UTF-8"));
}

#[test]
fn test_svg_roundtrip() {
    let xml = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="100">
  <defs><linearGradient id="g"><stop offset="0%" style="stop-color:rgb(255,255,0)"/></linearGradient></defs>
  <use xlink:href="#g"/>
  <text x="10" y="20">a &lt; b</text>
</svg>"##;
    let mut dom = Dom::new();
    let doc = parse_and_roundtrip(&mut dom, xml);
    let root = root_of(&dom, doc);
    let uses = dom
        .descendants(root)
        .find(|&n| dom.local_name(n) == Some("use"))
        .unwrap();
    assert_eq!(
        dom.get_attribute_ns(uses, Some("http://www.w3.org/1999/xlink"), "href"),
        Some("#g")
    );
}

#[test]
fn test_mixed_content_roundtrip() {
    let xml = "<doc><!-- note --><?pi data?><p>one <b>two</b> <![CDATA[<three>]]></p></doc>";
    let mut dom = Dom::new();
    let doc = parse_and_roundtrip(&mut dom, xml);
    assert_eq!(serialize(&dom, doc), xml);
    let p = dom.last_element_child(root_of(&dom, doc)).unwrap();
    assert_eq!(dom.text_content(p).as_deref(), Some("one two <three>"));
}

#[test]
fn test_carriage_return_survives_roundtrip() {
    let mut dom = Dom::new();
    let doc = parse_and_roundtrip(&mut dom, "<a>x&#13;y\r\nz</a>");
    let root = root_of(&dom, doc);
    assert_eq!(dom.text_content(root).as_deref(), Some("x\ry\nz"));
    assert_eq!(serialize(&dom, doc), "<a>x&#xD;y\nz</a>");
}

#[test]
fn test_declared_latin1_bytes() {
    let mut dom = Dom::new();
    let input = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><r>caf\xE9</r>";
    let doc = dom.parse_bytes(input).unwrap();
    let root = root_of(&dom, doc);
    assert_eq!(dom.text_content(root).as_deref(), Some("caf\u{e9}"));
}

#[test]
fn test_deep_clone_is_equal_and_detached() {
    let mut dom = Dom::new();
    let doc = dom
        .parse_str(r#"<r xmlns:p="http://p"><p:a k="v">t<b/></p:a><!--c--></r>"#)
        .unwrap();
    let root = root_of(&dom, doc);
    let copy = dom.clone_node(root, true);
    assert!(dom.is_equal_node(root, copy));
    assert!(!dom.is_same_node(root, copy));
    assert_eq!(dom.parent_node(copy), None);
    assert_eq!(dom.owner_document(copy), Some(doc));
    assert_eq!(serialize(&dom, copy), serialize(&dom, root));

    let shallow = dom.clone_node(root, false);
    assert!(!dom.has_child_nodes(shallow));
    assert_eq!(dom.get_attribute(shallow, "xmlns:p"), Some("http://p"));

    // Editing the copy leaves the original alone.
    let a = dom.first_child(copy).unwrap();
    dom.set_attribute(a, "k", "changed").unwrap();
    assert!(!dom.is_equal_node(root, copy));
}

#[test]
fn test_normalization_is_idempotent() {
    let mut dom = Dom::new();
    let doc = dom.parse_str(r#"<root xmlns="http://d"><a/></root>"#).unwrap();
    let root = root_of(&dom, doc);
    let x = dom.create_element_ns(doc, Some("http://x"), "x");
    let y = dom.create_element_ns(doc, Some("http://y"), "y:item");
    let plain = dom.create_element(doc, "plain");
    dom.append(root, &[x, y, plain]).unwrap();
    dom.set_attribute_ns(x, Some("http://attr"), "flag", "1").unwrap();

    dom.normalize_namespaces(doc).unwrap();
    let once = serialize(&dom, doc);
    dom.normalize_namespaces(doc).unwrap();
    assert_eq!(serialize(&dom, doc), once);

    // The normalized output resolves to the same names when read back.
    let again = dom.parse_str(&once).unwrap();
    let root2 = root_of(&dom, again);
    let names: Vec<_> = dom
        .children(root2)
        .map(|c| (dom.namespace_uri(c).map(str::to_string), dom.local_name(c).map(str::to_string)))
        .collect();
    assert_eq!(
        names,
        vec![
            (Some("http://d".to_string()), Some("a".to_string())),
            (Some("http://x".to_string()), Some("x".to_string())),
            (Some("http://y".to_string()), Some("item".to_string())),
            (None, Some("plain".to_string())),
        ]
    );
    let x2 = dom.children(root2).nth(1).unwrap();
    assert_eq!(dom.get_attribute_ns(x2, Some("http://attr"), "flag"), Some("1"));
}

#[test]
fn test_normalization_rejects_conflicting_prefix() {
    let mut dom = Dom::new();
    let doc = dom.parse_str(r#"<r xmlns:p="http://one"/>"#).unwrap();
    let root = root_of(&dom, doc);
    let child = dom.create_element_ns(doc, Some("http://two"), "p:c");
    dom.append_child(root, child).unwrap();
    let err = dom.normalize_namespaces(doc).unwrap_err();
    assert_eq!(err.kind, DomErrorKind::Namespace);
}

#[test]
fn test_attribute_map_order_and_replacement() {
    let mut dom = Dom::new();
    let doc = dom
        .parse_str(r#"<r xmlns:p="http://p" b="1" p:c="2" a="3"/>"#)
        .unwrap();
    let root = root_of(&dom, doc);
    assert_eq!(
        dom.get_attribute_names(root),
        vec!["xmlns:p", "b", "p:c", "a"]
    );

    // Overwriting keeps the slot; removal shifts later items down.
    dom.set_attribute_ns(root, Some("http://p"), "p:c", "changed").unwrap();
    let removed = dom.remove_attribute(root, "b").unwrap();
    assert_eq!(dom.owner_element(removed), None);
    let map = dom.attribute_map(root).unwrap();
    assert_eq!(map.len(), 3);
    let second = map.item(1).unwrap();
    assert_eq!(dom.value(second), Some("changed"));
    assert_eq!(dom.attribute_item(root, 3), None);

    // A detached attribute can be moved onto another element.
    let other = dom.create_element(doc, "other");
    assert_eq!(dom.set_attribute_node(other, removed).unwrap(), None);
    assert_eq!(dom.get_attribute(other, "b"), Some("1"));
    let err = dom.set_attribute_node(root, removed).unwrap_err();
    assert_eq!(err.kind, DomErrorKind::InUseAttribute);
}

#[test]
fn test_prefixed_and_plain_attribute_names_coexist() {
    let mut dom = Dom::new();
    let doc = dom.parse_str("<r/>").unwrap();
    let root = root_of(&dom, doc);
    dom.set_attribute(root, "a", "1").unwrap();
    dom.set_attribute(root, "x:a", "2").unwrap();
    assert_eq!(dom.get_attribute(root, "a"), Some("1"));
    assert_eq!(dom.get_attribute(root, "x:a"), Some("2"));
    assert_eq!(dom.get_attribute_names(root), vec!["a", "x:a"]);
    assert_eq!(serialize(&dom, root), r#"<r a="1" x:a="2"></r>"#);
}

#[test]
fn test_document_cardinality() {
    let mut dom = Dom::new();
    let doc = dom.create_document();
    let dt = dom.create_document_type(doc, "r", None, None);
    let r = dom.create_element(doc, "r");
    let second = dom.create_element(doc, "s");
    let text = dom.create_text_node(doc, "x");

    dom.append_child(doc, r).unwrap();
    let err = dom.append_child(doc, second).unwrap_err();
    assert_eq!(err.kind, DomErrorKind::HierarchyRequest);
    let err = dom.append_child(doc, text).unwrap_err();
    assert_eq!(err.kind, DomErrorKind::HierarchyRequest);

    let err = dom.append_child(doc, dt).unwrap_err();
    assert_eq!(err.kind, DomErrorKind::HierarchyRequest);
    dom.insert_before(doc, dt, Some(r)).unwrap();
    assert_eq!(dom.doctype(doc), Some(dt));

    // Replacing the document element keeps the count at one.
    dom.replace_child(doc, second, r).unwrap();
    assert_eq!(dom.document_element(doc), Some(second));
    assert_eq!(dom.children(doc).count(), 2);
}

#[test]
fn test_live_child_list_tracks_mutations() {
    let mut dom = Dom::new();
    let doc = dom.parse_str("<r><a/><b/><c/></r>").unwrap();
    let root = root_of(&dom, doc);
    let mut list = dom.child_nodes(root);
    assert_eq!(list.len(&dom), 3);
    let b = list.item(&dom, 1).unwrap();

    dom.remove_child(root, b).unwrap();
    assert_eq!(list.len(&dom), 2);
    assert_eq!(dom.local_name(list.item(&dom, 1).unwrap()), Some("c"));

    dom.prepend(root, &[b]).unwrap();
    assert_eq!(list.item(&dom, 0), Some(b));
    assert_eq!(list.iter(&dom).count(), 3);
}

#[test]
fn test_adopt_then_insert_into_other_document() {
    let mut dom = Dom::new();
    let source = dom.parse_str(r#"<s><item id="1">x</item></s>"#).unwrap();
    let target = dom.parse_str("<t/>").unwrap();
    let item = dom.first_child(root_of(&dom, source)).unwrap();

    dom.adopt_node(target, item).unwrap();
    let t = root_of(&dom, target);
    dom.append_child(t, item).unwrap();
    assert_eq!(serialize(&dom, target), r#"<t><item id="1">x</item></t>"#);
    assert_eq!(serialize(&dom, source), "<s></s>");
    let attr = dom.get_attribute_node(item, "id").unwrap();
    assert_eq!(dom.owner_document(attr), Some(target));
}

#[test]
#[should_panic(expected = "adopt it first")]
fn test_cross_document_insert_without_adopt_panics() {
    let mut dom = Dom::new();
    let a = dom.parse_str("<a/>").unwrap();
    let b = dom.parse_str("<b/>").unwrap();
    let foreign = dom.create_element(b, "x");
    let root = root_of(&dom, a);
    let _ = dom.append_child(root, foreign);
}

#[test]
fn test_syntax_errors_carry_locations() {
    let mut dom = Dom::new();
    let err = dom.parse_str("<a>\n  <b></c>\n</a>").unwrap_err();
    assert_eq!(err.kind, DomErrorKind::Syntax);
    let location = err.location.unwrap();
    assert_eq!(location.line, 2);
    assert!(err.to_string().starts_with("parse: SyntaxError: mismatched closing tag"));
}
