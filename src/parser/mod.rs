//! Building documents from markup.
//!
//! Markup is tokenized by [`token::XmlTokenizer`] (a thin adapter over the
//! `xmlparser` crate) and turned into a tree by [`TreeBuilder`]. The builder
//! accepts any [`token::TokenSource`], so other front ends can feed it
//! directly.
//!
//! ```
//! use xmldom::parser::BuildOptions;
//! use xmldom::Dom;
//!
//! let mut dom = Dom::new();
//! let opts = BuildOptions::default().no_blanks(true).strict_namespaces(true);
//! let doc = dom.parse_str_with_options("<a>\n  <b/>\n</a>", opts).unwrap();
//! let a = dom.document_element(doc).unwrap();
//! assert_eq!(dom.children(a).count(), 1);
//! ```

mod builder;
mod doctype;
pub mod token;

pub use builder::TreeBuilder;

use crate::error::DomError;
use crate::tree::{Dom, NodeId};
use token::XmlTokenizer;

/// Options controlling tree construction.
///
/// Use the builder pattern to configure options:
///
/// ```
/// use xmldom::parser::BuildOptions;
///
/// let opts = BuildOptions::default()
///     .auto_close(["br", "hr"])
///     .no_blanks(true);
/// assert!(!opts.strict_namespaces);
/// assert_eq!(opts.max_depth, 256);
/// ```
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Local names of elements that never take children. A start tag with
    /// one of these names (compared case-insensitively) is closed at once,
    /// and a matching end tag right after it is ignored.
    pub auto_close: Vec<String>,
    /// If true, an unbound prefix is a `Namespace` error. Otherwise the
    /// prefix text itself is used as the namespace URI.
    pub strict_namespaces: bool,
    /// If true, drop whitespace-only character data inside elements.
    pub no_blanks: bool,
    /// Maximum element nesting depth (default: 256).
    pub max_depth: u32,
}

/// Default maximum element nesting depth.
const DEFAULT_MAX_DEPTH: u32 = 256;

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            auto_close: Vec::new(),
            strict_namespaces: false,
            no_blanks: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl BuildOptions {
    /// Sets the auto-close element names.
    #[must_use]
    pub fn auto_close<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.auto_close = names.into_iter().map(Into::into).collect();
        self
    }

    /// Enables or disables strict namespace resolution.
    #[must_use]
    pub fn strict_namespaces(mut self, yes: bool) -> Self {
        self.strict_namespaces = yes;
        self
    }

    /// Enables or disables stripping of blank text nodes.
    #[must_use]
    pub fn no_blanks(mut self, yes: bool) -> Self {
        self.no_blanks = yes;
        self
    }

    /// Sets the maximum element nesting depth.
    #[must_use]
    pub fn max_depth(mut self, max: u32) -> Self {
        self.max_depth = max;
        self
    }

    pub(crate) fn closes_automatically(&self, local: &str) -> bool {
        self.auto_close.iter().any(|n| n.eq_ignore_ascii_case(local))
    }
}

impl Dom {
    /// Builds a new document from XML text with default options.
    ///
    /// # Errors
    ///
    /// Returns the first error met while building. The partially built
    /// document stays in the arena.
    pub fn parse_str(&mut self, text: &str) -> Result<NodeId, DomError> {
        self.parse_str_with_options(text, BuildOptions::default())
    }

    /// Builds a new document from XML text.
    ///
    /// # Errors
    ///
    /// See [`Dom::parse_str`].
    pub fn parse_str_with_options(
        &mut self,
        text: &str,
        options: BuildOptions,
    ) -> Result<NodeId, DomError> {
        let mut tokens = XmlTokenizer::new(text);
        TreeBuilder::new(self, options).build(&mut tokens)
    }

    /// Builds a new document from raw bytes, detecting the encoding from a
    /// byte order mark or the XML declaration.
    ///
    /// # Errors
    ///
    /// Returns `Syntax` if the bytes cannot be decoded, otherwise see
    /// [`Dom::parse_str`].
    pub fn parse_bytes(&mut self, bytes: &[u8]) -> Result<NodeId, DomError> {
        self.parse_bytes_with_options(bytes, BuildOptions::default())
    }

    /// Builds a new document from raw bytes.
    ///
    /// # Errors
    ///
    /// See [`Dom::parse_bytes`].
    pub fn parse_bytes_with_options(
        &mut self,
        bytes: &[u8],
        options: BuildOptions,
    ) -> Result<NodeId, DomError> {
        let text = crate::encoding::decode_to_utf8(bytes)?;
        self.parse_str_with_options(&text, options)
    }
}

/// Finds `name="value"` (or single-quoted) in the body of an XML
/// declaration.
pub(crate) fn pseudo_attribute<'a>(decl: &'a str, name: &str) -> Option<&'a str> {
    let mut rest = decl;
    while let Some(pos) = rest.find(name) {
        let boundary = rest[..pos]
            .chars()
            .next_back()
            .map_or(true, |c| c.is_ascii_whitespace() || c == '?');
        let after = rest[pos + name.len()..].trim_start();
        rest = &rest[pos + name.len()..];
        if !boundary {
            continue;
        }
        let Some(value) = after.strip_prefix('=') else {
            continue;
        };
        let value = value.trim_start();
        let quote = value.chars().next().filter(|&q| q == '"' || q == '\'')?;
        let body = &value[1..];
        return body.find(quote).map(|end| &body[..end]);
    }
    None
}
