//! Tree construction from a token stream.
//!
//! The builder keeps one frame per open element plus a namespace
//! [`ScopeChain`]. Names are resolved as each start tag arrives; every node
//! is attached through the validated insertion path, so a token stream can
//! never produce a tree the mutation API would reject.

use std::sync::Arc;

use super::doctype::parse_doctype;
use super::token::{RawAttribute, RawName, Token, TokenSource};
use super::{pseudo_attribute, BuildOptions};
use crate::error::DomError;
use crate::namespace::scope::ScopeChain;
use crate::namespace::XMLNS_NAMESPACE;
use crate::tree::{Dom, NodeId};
use crate::util::qname::QName;

#[derive(Debug)]
struct OpenElement {
    element: NodeId,
    name: QName,
}

/// Builds one document from a stream of [`Token`]s.
///
/// The document is created up front, so [`TreeBuilder::document`] names it
/// even when building later fails; whatever was built before the error stays
/// in the arena.
pub struct TreeBuilder<'d> {
    dom: &'d mut Dom,
    document: NodeId,
    options: BuildOptions,
    open: Vec<OpenElement>,
    scopes: ScopeChain,
    auto_closed: Option<QName>,
    at_start: bool,
}

impl<'d> TreeBuilder<'d> {
    /// Creates a builder and the empty document it fills.
    pub fn new(dom: &'d mut Dom, options: BuildOptions) -> Self {
        let document = dom.create_document();
        Self {
            dom,
            document,
            options,
            open: Vec::new(),
            scopes: ScopeChain::new(),
            auto_closed: None,
            at_start: true,
        }
    }

    /// The document being built.
    #[must_use]
    pub fn document(&self) -> NodeId {
        self.document
    }

    /// Feeds every token from `source`, then finishes the document.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the source or by a token, with the
    /// source location attached when the source knows it.
    pub fn build<'a, S>(mut self, source: &mut S) -> Result<NodeId, DomError>
    where
        S: TokenSource<'a> + ?Sized,
    {
        while let Some(token) = source.next_token() {
            if let Err(err) = token.and_then(|token| self.feed(token)) {
                let err = match source.location() {
                    Some(location) => err.at(location),
                    None => err,
                };
                log::debug!(target: "xmldom::parser", "build stopped: {err}");
                return Err(err);
            }
        }
        self.finish()
    }

    /// Applies one token to the tree.
    ///
    /// # Errors
    ///
    /// Returns `Syntax` for malformed structure, `Namespace` for an unbound
    /// prefix in strict mode, and `HierarchyRequest` when the token would
    /// place a node where it may not appear.
    pub fn feed(&mut self, token: Token<'_>) -> Result<(), DomError> {
        let at_start = std::mem::replace(&mut self.at_start, false);
        let auto_closed = self.auto_closed.take();
        match token {
            Token::StartTag { name, attributes } => self.start_tag(name, &attributes),
            Token::EndTag { name } => self.end_tag(name, auto_closed),
            Token::CharData(text) => self.char_data(&text),
            Token::Comment(text) => {
                let node = self.dom.create_comment(self.document, text);
                self.append(node)
            }
            Token::ProcessingInstruction { target: "xml", data } => {
                if !at_start {
                    return Err(DomError::syntax(
                        "the XML declaration must appear at the start of the document",
                        None,
                    ));
                }
                self.declaration(data)
            }
            Token::ProcessingInstruction { target, data } => {
                let node = self
                    .dom
                    .create_processing_instruction(self.document, target, data);
                self.append(node)
            }
            Token::Directive(raw) => self.directive(&raw),
        }
    }

    /// Ends the input.
    ///
    /// # Errors
    ///
    /// Returns `Syntax` if an element is still open.
    pub fn finish(self) -> Result<NodeId, DomError> {
        if let Some(open) = self.open.last() {
            return Err(DomError::syntax(
                format!("unexpected end of input: '{}' is not closed", open.name),
                None,
            ));
        }
        Ok(self.document)
    }

    fn parent(&self) -> NodeId {
        self.open.last().map_or(self.document, |o| o.element)
    }

    fn append(&mut self, node: NodeId) -> Result<(), DomError> {
        let parent = self.parent();
        self.dom.append_child(parent, node).map(|_| ())
    }

    /// Resolves a prefix, or the default namespace for `None`.
    fn resolve(&mut self, prefix: Option<&str>) -> Result<Option<Arc<str>>, DomError> {
        let Some(prefix) = prefix else {
            return Ok(self.scopes.default_namespace().cloned());
        };
        if prefix == "xmlns" {
            return Ok(Some(self.dom.intern(XMLNS_NAMESPACE)));
        }
        if let Some(uri) = self.scopes.resolve(Some(prefix)) {
            return Ok(Some(self.dom.intern(uri)));
        }
        if self.options.strict_namespaces {
            return Err(DomError::namespace(
                "parse",
                format!("prefix '{prefix}' is not bound"),
            ));
        }
        log::warn!(
            target: "xmldom::parser",
            "prefix '{prefix}' is not bound; using it as its own namespace"
        );
        Ok(Some(self.dom.intern(prefix)))
    }

    fn qname(&mut self, name: RawName<'_>, namespace: Option<Arc<str>>) -> QName {
        let local = self.dom.intern(name.local);
        let prefix = name.prefix.map(|p| self.dom.intern(p));
        QName::new(local, prefix, namespace)
    }

    fn start_tag(&mut self, name: RawName<'_>, attributes: &[RawAttribute<'_>]) -> Result<(), DomError> {
        let depth = u32::try_from(self.open.len()).unwrap_or(u32::MAX);
        if depth >= self.options.max_depth {
            return Err(DomError::syntax(
                format!(
                    "element '{name}' exceeds the maximum nesting depth of {}",
                    self.options.max_depth
                ),
                None,
            ));
        }
        self.scopes.push();
        for attr in attributes {
            let prefix = match (attr.name.prefix, attr.name.local) {
                (Some("xmlns"), local) => Some(self.dom.intern(local)),
                (None, "xmlns") => None,
                _ => continue,
            };
            let uri = self.dom.intern(&attr.value);
            self.scopes.bind(prefix, uri);
        }

        let namespace = self.resolve(name.prefix)?;
        let qname = self.qname(name, namespace);
        let element = self.dom.create_element_named(self.document, qname.clone());

        for attr in attributes {
            let namespace = match attr.name.prefix {
                None if attr.name.local == "xmlns" => Some(self.dom.intern(XMLNS_NAMESPACE)),
                None => None,
                Some(prefix) => self.resolve(Some(prefix))?,
            };
            let attr_name = self.qname(attr.name, namespace);
            if self
                .dom
                .has_attribute_ns(element, attr_name.namespace(), attr_name.local())
            {
                return Err(DomError::syntax(
                    format!("duplicate attribute '{}' on '{qname}'", attr.name),
                    None,
                ));
            }
            let node = self
                .dom
                .create_attribute_named(self.document, attr_name, attr.value.to_string());
            self.dom.push_attribute(element, node);
        }

        self.append(element)?;
        log::trace!(target: "xmldom::parser", "opened <{qname}> as {element:?}");

        if self.options.closes_automatically(name.local) {
            self.scopes.pop();
            self.auto_closed = Some(qname);
        } else {
            self.open.push(OpenElement {
                element,
                name: qname,
            });
        }
        Ok(())
    }

    fn end_tag(&mut self, name: RawName<'_>, auto_closed: Option<QName>) -> Result<(), DomError> {
        if let Some(closed) = auto_closed {
            if closed.prefix() == name.prefix && closed.local().eq_ignore_ascii_case(name.local) {
                return Ok(());
            }
        }
        let Some(top) = self.open.last().map(|o| o.name.clone()) else {
            return Err(DomError::syntax(
                format!("closing tag '{name}' without an open element"),
                None,
            ));
        };
        let mismatch = || {
            DomError::syntax(
                format!("mismatched closing tag '{name}', expected '{top}'"),
                None,
            )
        };
        // An unbound prefix cannot match any open element.
        let namespace = self.resolve(name.prefix).map_err(|_| mismatch())?;
        if top.namespace() != namespace.as_deref() || !top.local().eq_ignore_ascii_case(name.local)
        {
            return Err(mismatch());
        }
        self.open.pop();
        self.scopes.pop();
        Ok(())
    }

    fn char_data(&mut self, text: &str) -> Result<(), DomError> {
        let blank = text.chars().all(|c| matches!(c, ' ' | '\t' | '\n' | '\r'));
        if self.open.is_empty() {
            if blank {
                return Ok(());
            }
            return Err(DomError::syntax(
                "character data outside the document element",
                None,
            ));
        }
        if blank && self.options.no_blanks {
            return Ok(());
        }
        let node = self.dom.create_text_node(self.document, text);
        self.append(node)
    }

    fn declaration(&mut self, data: &str) -> Result<(), DomError> {
        let standalone = match pseudo_attribute(data, "standalone") {
            None => None,
            Some("yes") => Some(true),
            Some("no") => Some(false),
            Some(other) => {
                return Err(DomError::syntax(
                    format!("invalid standalone value '{other}'"),
                    None,
                ))
            }
        };
        self.dom.set_xml_declaration(
            self.document,
            pseudo_attribute(data, "version").map(str::to_string),
            pseudo_attribute(data, "encoding").map(str::to_string),
            standalone,
        );
        Ok(())
    }

    fn directive(&mut self, raw: &str) -> Result<(), DomError> {
        if let Some(body) = raw.strip_prefix("[CDATA[").or_else(|| raw.strip_prefix("CDATA[")) {
            let content = body
                .strip_suffix("]]")
                .ok_or_else(|| DomError::syntax("unterminated CDATA section", None))?;
            if self.open.is_empty() {
                return Err(DomError::syntax(
                    "CDATA section outside the document element",
                    None,
                ));
            }
            let node = self.dom.create_cdata_section(self.document, content);
            return self.append(node);
        }
        match parse_doctype(raw)? {
            Some(decl) => {
                let node = self.dom.create_document_type_with_subset(
                    self.document,
                    decl.name,
                    decl.public_id,
                    decl.system_id,
                    decl.internal_subset,
                );
                self.append(node)
            }
            None => {
                log::debug!(target: "xmldom::parser", "ignoring directive <!{raw}>");
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for TreeBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeBuilder")
            .field("document", &self.document)
            .field("options", &self.options)
            .field("open", &self.open)
            .finish_non_exhaustive()
    }
}
