//! The token stream consumed by the tree builder.
//!
//! The builder only understands six kinds of [`Token`]. Anything that can
//! produce them implements [`TokenSource`]; [`XmlTokenizer`] does so over
//! the `xmlparser` crate, and [`TokenStream`] wraps a plain iterator.

use std::borrow::Cow;
use std::fmt;

use xmlparser::{ElementEnd, StrSpan, TextPos, Tokenizer};

use crate::error::{DomError, SourceLocation};
use crate::util::qname::split_qname;

/// A name exactly as written in markup, before namespace resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawName<'a> {
    pub prefix: Option<&'a str>,
    pub local: &'a str,
}

impl<'a> RawName<'a> {
    /// Splits `prefix:local` text.
    #[must_use]
    pub fn parse(qualified: &'a str) -> Self {
        let (prefix, local) = split_qname(qualified);
        Self {
            prefix: prefix.filter(|p| !p.is_empty()),
            local,
        }
    }

    fn from_spans(prefix: StrSpan<'a>, local: StrSpan<'a>) -> Self {
        Self {
            prefix: Some(prefix.as_str()).filter(|p| !p.is_empty()),
            local: local.as_str(),
        }
    }
}

impl fmt::Display for RawName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = self.prefix {
            write!(f, "{prefix}:")?;
        }
        f.write_str(self.local)
    }
}

/// An attribute with its value already entity-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttribute<'a> {
    pub name: RawName<'a>,
    pub value: Cow<'a, str>,
}

impl<'a> RawAttribute<'a> {
    #[must_use]
    pub fn new(qualified: &'a str, value: impl Into<Cow<'a, str>>) -> Self {
        Self {
            name: RawName::parse(qualified),
            value: value.into(),
        }
    }
}

/// One markup event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    StartTag {
        name: RawName<'a>,
        attributes: Vec<RawAttribute<'a>>,
    },
    EndTag {
        name: RawName<'a>,
    },
    /// Character data with entity references decoded.
    CharData(Cow<'a, str>),
    Comment(&'a str),
    ProcessingInstruction {
        target: &'a str,
        data: &'a str,
    },
    /// Everything between `<!` and `>` that is not a comment, such as
    /// `DOCTYPE ...` or `[CDATA[...]]`.
    Directive(Cow<'a, str>),
}

/// A producer of [`Token`]s.
pub trait TokenSource<'a> {
    /// Returns the next token, `None` at the end of input. An error ends the
    /// stream.
    fn next_token(&mut self) -> Option<Result<Token<'a>, DomError>>;

    /// Where the most recently returned token started, if known.
    fn location(&self) -> Option<SourceLocation> {
        None
    }
}

/// A [`TokenSource`] over an iterator of ready-made tokens.
///
/// ```
/// use xmldom::parser::token::{RawName, Token, TokenStream};
/// use xmldom::parser::TreeBuilder;
/// use xmldom::Dom;
///
/// let mut dom = Dom::new();
/// let mut tokens = TokenStream::new([
///     Token::StartTag { name: RawName::parse("root"), attributes: vec![] },
///     Token::EndTag { name: RawName::parse("root") },
/// ]);
/// let doc = TreeBuilder::new(&mut dom, Default::default()).build(&mut tokens).unwrap();
/// assert!(dom.document_element(doc).is_some());
/// ```
#[derive(Debug, Clone)]
pub struct TokenStream<I> {
    tokens: I,
}

impl<I> TokenStream<I> {
    pub fn new<T>(tokens: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            tokens: tokens.into_iter(),
        }
    }
}

impl<'a, I> TokenSource<'a> for TokenStream<I>
where
    I: Iterator<Item = Token<'a>>,
{
    fn next_token(&mut self) -> Option<Result<Token<'a>, DomError>> {
        self.tokens.next().map(Ok)
    }
}

/// Tokenizes XML text with `xmlparser`.
///
/// Predefined and numeric character references are decoded; any other
/// entity reference is a syntax error. Line ends are normalized to `\n`,
/// and attribute values have their literal whitespace replaced by spaces.
/// The XML declaration is reported as a processing instruction with target
/// `xml`.
pub struct XmlTokenizer<'a> {
    text: &'a str,
    inner: Tokenizer<'a>,
    start_tag: Option<(RawName<'a>, Vec<RawAttribute<'a>>)>,
    pending: Option<Token<'a>>,
    dtd_start: Option<usize>,
    position: usize,
    failed: bool,
}

impl<'a> XmlTokenizer<'a> {
    #[must_use]
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            inner: Tokenizer::from(text),
            start_tag: None,
            pending: None,
            dtd_start: None,
            position: 0,
            failed: false,
        }
    }

    fn location_at(&self, offset: usize) -> SourceLocation {
        let pos = xmlparser::Stream::from(self.text).gen_text_pos_from(offset);
        SourceLocation {
            line: pos.row,
            column: pos.col,
            byte_offset: offset,
        }
    }

    fn error_at(&self, message: impl Into<String>, offset: usize) -> DomError {
        DomError::syntax(message, Some(self.location_at(offset)))
    }

    fn tokenizer_error(&self, err: &xmlparser::Error) -> DomError {
        let pos = err.pos();
        let location = SourceLocation {
            line: pos.row,
            column: pos.col,
            byte_offset: byte_offset(self.text, pos),
        };
        DomError::syntax(err.to_string(), Some(location))
    }

    /// Text between `<!` and `>` for a directive spanning `start..end`.
    fn directive(&self, start: usize, end: usize) -> Token<'a> {
        let inner = self.text.get(start + 2..end.saturating_sub(1)).unwrap_or("");
        Token::Directive(Cow::Borrowed(inner.trim_end()))
    }

    fn convert(&mut self, token: xmlparser::Token<'a>) -> Result<Option<Token<'a>>, DomError> {
        use xmlparser::Token as X;

        if self.dtd_start.is_some() && !matches!(token, X::DtdEnd { .. }) {
            return Ok(None);
        }
        match token {
            X::Declaration { span, .. } => {
                self.position = span.start();
                let data = span
                    .as_str()
                    .strip_prefix("<?xml")
                    .and_then(|s| s.strip_suffix("?>"))
                    .unwrap_or("")
                    .trim();
                Ok(Some(Token::ProcessingInstruction { target: "xml", data }))
            }
            X::ProcessingInstruction {
                target,
                content,
                span,
            } => {
                self.position = span.start();
                Ok(Some(Token::ProcessingInstruction {
                    target: target.as_str(),
                    data: content.map_or("", |c| c.as_str()),
                }))
            }
            X::Comment { text, span } => {
                self.position = span.start();
                Ok(Some(Token::Comment(text.as_str())))
            }
            X::DtdStart { span, .. } => {
                self.position = span.start();
                self.dtd_start = Some(span.start());
                Ok(None)
            }
            X::EmptyDtd { span, .. } => {
                self.position = span.start();
                Ok(Some(self.directive(span.start(), span.end())))
            }
            X::DtdEnd { span } => {
                let start = self.dtd_start.take().unwrap_or(span.start());
                Ok(Some(self.directive(start, span.end())))
            }
            X::EntityDeclaration { .. } => Ok(None),
            X::ElementStart { prefix, local, span } => {
                self.position = span.start();
                self.start_tag = Some((RawName::from_spans(prefix, local), Vec::new()));
                Ok(None)
            }
            X::Attribute {
                prefix,
                local,
                value,
                ..
            } => {
                let value = self.decode(value, true)?;
                if let Some((_, attributes)) = &mut self.start_tag {
                    attributes.push(RawAttribute {
                        name: RawName::from_spans(prefix, local),
                        value,
                    });
                }
                Ok(None)
            }
            X::ElementEnd { end, span } => match end {
                ElementEnd::Open | ElementEnd::Empty => {
                    let Some((name, attributes)) = self.start_tag.take() else {
                        return Err(self.error_at("tag end without a tag start", span.start()));
                    };
                    if matches!(end, ElementEnd::Empty) {
                        self.pending = Some(Token::EndTag { name });
                    }
                    Ok(Some(Token::StartTag { name, attributes }))
                }
                ElementEnd::Close(prefix, local) => {
                    self.position = span.start();
                    Ok(Some(Token::EndTag {
                        name: RawName::from_spans(prefix, local),
                    }))
                }
            },
            X::Text { text } => {
                self.position = text.start();
                Ok(Some(Token::CharData(self.decode(text, false)?)))
            }
            X::Cdata { text, span } => {
                self.position = span.start();
                let raw = self.text.get(span.start() + 2..span.end() - 1).unwrap_or("");
                Ok(Some(Token::Directive(normalize_line_ends(
                    Cow::Borrowed(raw),
                    text.as_str().contains('\r'),
                ))))
            }
        }
    }

    /// Decodes references and normalizes whitespace in text or an
    /// attribute value.
    fn decode(&self, span: StrSpan<'a>, attribute: bool) -> Result<Cow<'a, str>, DomError> {
        let raw = span.as_str();
        let special: &[char] = if attribute {
            &['&', '\r', '\n', '\t']
        } else {
            &['&', '\r']
        };
        if !raw.contains(special) {
            return Ok(Cow::Borrowed(raw));
        }

        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(i) = rest.find(special) {
            out.push_str(&rest[..i]);
            let offset = span.start() + (raw.len() - rest.len()) + i;
            match rest.as_bytes()[i] {
                b'&' => {
                    let end = rest[i..]
                        .find(';')
                        .ok_or_else(|| self.error_at("unterminated entity reference", offset))?;
                    let name = &rest[i + 1..i + end];
                    let c = resolve_reference(name).ok_or_else(|| {
                        self.error_at(format!("unknown entity reference '&{name};'"), offset)
                    })?;
                    out.push(c);
                    rest = &rest[i + end + 1..];
                }
                b'\r' => {
                    out.push(if attribute { ' ' } else { '\n' });
                    rest = rest[i + 1..].strip_prefix('\n').unwrap_or(&rest[i + 1..]);
                }
                _ => {
                    out.push(' ');
                    rest = &rest[i + 1..];
                }
            }
        }
        out.push_str(rest);
        Ok(Cow::Owned(out))
    }
}

impl<'a> TokenSource<'a> for XmlTokenizer<'a> {
    fn next_token(&mut self) -> Option<Result<Token<'a>, DomError>> {
        if let Some(token) = self.pending.take() {
            return Some(Ok(token));
        }
        if self.failed {
            return None;
        }
        loop {
            let result = match self.inner.next()? {
                Ok(token) => self.convert(token),
                Err(err) => Err(self.tokenizer_error(&err)),
            };
            match result {
                Ok(Some(token)) => return Some(Ok(token)),
                Ok(None) => {}
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err));
                }
            }
        }
    }

    fn location(&self) -> Option<SourceLocation> {
        Some(self.location_at(self.position))
    }
}

impl fmt::Debug for XmlTokenizer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmlTokenizer")
            .field("position", &self.position)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

/// Resolves the name between `&` and `;`.
fn resolve_reference(name: &str) -> Option<char> {
    let code = match name {
        "lt" => return Some('<'),
        "gt" => return Some('>'),
        "amp" => return Some('&'),
        "apos" => return Some('\''),
        "quot" => return Some('"'),
        _ => {
            let digits = name.strip_prefix('#')?;
            match digits.strip_prefix('x') {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse::<u32>().ok()?,
            }
        }
    };
    // Only code points in the XML `Char` production may be referenced.
    char::from_u32(code)
        .filter(|&c| matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{FFFD}' | '\u{10000}'..))
}

fn normalize_line_ends(text: Cow<'_, str>, has_cr: bool) -> Cow<'_, str> {
    if has_cr {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        text
    }
}

/// Converts a 1-based row/column position back into a byte offset.
fn byte_offset(text: &str, pos: TextPos) -> usize {
    let mut offset = 0;
    for (row, line) in text.split_inclusive('\n').enumerate() {
        if row + 1 == pos.row as usize {
            let column = (pos.col as usize).saturating_sub(1);
            return offset + line.char_indices().nth(column).map_or(line.len(), |(i, _)| i);
        }
        offset += line.len();
    }
    text.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomErrorKind;
    use pretty_assertions::assert_eq;

    fn tokens(text: &str) -> Vec<Token<'_>> {
        let mut source = XmlTokenizer::new(text);
        let mut out = Vec::new();
        while let Some(token) = source.next_token() {
            out.push(token.unwrap());
        }
        out
    }

    #[test]
    fn test_empty_element_yields_start_and_end() {
        assert_eq!(
            tokens(r#"<el a1="val"/>"#),
            vec![
                Token::StartTag {
                    name: RawName::parse("el"),
                    attributes: vec![RawAttribute::new("a1", "val")],
                },
                Token::EndTag {
                    name: RawName::parse("el")
                },
            ]
        );
    }

    #[test]
    fn test_prefixed_names() {
        let toks = tokens(r#"<h:note xmlns:h="http://x"></h:note>"#);
        let Token::StartTag { name, attributes } = &toks[0] else {
            panic!("expected a start tag");
        };
        assert_eq!(name.prefix, Some("h"));
        assert_eq!(name.local, "note");
        assert_eq!(attributes[0].name.prefix, Some("xmlns"));
        assert_eq!(attributes[0].name.local, "h");
        assert_eq!(name.to_string(), "h:note");
    }

    #[test]
    fn test_entity_decoding() {
        let toks = tokens("<a t=\"&lt;&#65;&#x42;\">x &amp; y&apos;&quot;&gt;</a>");
        let Token::StartTag { attributes, .. } = &toks[0] else {
            panic!("expected a start tag");
        };
        assert_eq!(attributes[0].value, "<AB");
        assert_eq!(toks[1], Token::CharData(Cow::Borrowed("x & y'\">")));
    }

    #[test]
    fn test_reference_outside_char_range_is_syntax_error() {
        for text in ["<a>&#1;</a>", "<a>&#x0;</a>", "<a>&#xFFFE;</a>", r#"<a v="&#x1F;"/>"#] {
            let mut source = XmlTokenizer::new(text);
            let mut error = None;
            while let Some(token) = source.next_token() {
                if let Err(err) = token {
                    error = Some(err);
                }
            }
            let error = error.unwrap();
            assert_eq!(error.kind, DomErrorKind::Syntax, "{text}");
        }
        assert_eq!(resolve_reference("#9"), Some('\t'));
        assert_eq!(resolve_reference("#xD"), Some('\r'));
        assert_eq!(resolve_reference("#x10000"), Some('\u{10000}'));
    }

    #[test]
    fn test_unknown_entity_is_syntax_error() {
        let mut source = XmlTokenizer::new("<a>&nbsp;</a>");
        let mut error = None;
        while let Some(token) = source.next_token() {
            if let Err(err) = token {
                error = Some(err);
            }
        }
        let error = error.unwrap();
        assert_eq!(error.kind, DomErrorKind::Syntax);
        assert_eq!(error.location.map(|l| l.byte_offset), Some(3));
    }

    #[test]
    fn test_attribute_whitespace_and_line_ends() {
        let toks = tokens("<a v=\"x\ty\r\nz&#10;\">l1\r\nl2\rl3</a>");
        let Token::StartTag { attributes, .. } = &toks[0] else {
            panic!("expected a start tag");
        };
        assert_eq!(attributes[0].value, "x y z\n");
        assert_eq!(toks[1], Token::CharData(Cow::Borrowed("l1\nl2\nl3")));
    }

    #[test]
    fn test_declaration_becomes_xml_pi() {
        let toks = tokens(r#"<?xml version="1.0" encoding="UTF-8"?><r/>"#);
        assert_eq!(
            toks[0],
            Token::ProcessingInstruction {
                target: "xml",
                data: r#"version="1.0" encoding="UTF-8""#,
            }
        );
    }

    #[test]
    fn test_cdata_and_comment() {
        let toks = tokens("<r><![CDATA[<x>]]><!--c--><?pi d?></r>");
        assert_eq!(toks[1], Token::Directive(Cow::Borrowed("[CDATA[<x>]]")));
        assert_eq!(toks[2], Token::Comment("c"));
        assert_eq!(
            toks[3],
            Token::ProcessingInstruction {
                target: "pi",
                data: "d"
            }
        );
    }

    #[test]
    fn test_doctype_directive() {
        let toks = tokens("<!DOCTYPE note [ <!ELEMENT note (to,from,heading,body)> ]><note/>");
        assert_eq!(
            toks[0],
            Token::Directive(Cow::Borrowed(
                "DOCTYPE note [ <!ELEMENT note (to,from,heading,body)> ]"
            ))
        );
        assert!(matches!(toks[1], Token::StartTag { .. }));

        let toks = tokens(r#"<!DOCTYPE html SYSTEM "about:legacy-compat"><html/>"#);
        assert_eq!(
            toks[0],
            Token::Directive(Cow::Borrowed(r#"DOCTYPE html SYSTEM "about:legacy-compat""#))
        );
    }

    #[test]
    fn test_tokenizer_error_has_location() {
        let mut source = XmlTokenizer::new("<a>\n<b =></a>");
        let err = loop {
            match source.next_token() {
                Some(Err(err)) => break err,
                Some(Ok(_)) => {}
                None => panic!("expected an error"),
            }
        };
        assert_eq!(err.kind, DomErrorKind::Syntax);
        assert_eq!(err.location.map(|l| l.line), Some(2));
        assert!(source.next_token().is_none());
    }

    #[test]
    fn test_token_stream_wraps_iterator() {
        let mut stream = TokenStream::new(vec![Token::Comment("x")]);
        assert_eq!(stream.next_token(), Some(Ok(Token::Comment("x"))));
        assert_eq!(stream.next_token(), None);
        assert_eq!(stream.location(), None);
    }
}
