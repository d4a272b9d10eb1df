//! Document type declarations.
//!
//! A `DOCTYPE` directive is split into its name, external identifiers and
//! internal subset by a small whitespace/delimiter lexer. The internal
//! subset is kept verbatim (surrounding whitespace included) and never
//! interpreted.

use crate::error::DomError;

/// The parts of a `DOCTYPE` directive, borrowed from the directive text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct DoctypeDecl<'a> {
    pub name: &'a str,
    pub public_id: Option<&'a str>,
    pub system_id: Option<&'a str>,
    pub internal_subset: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexeme<'a> {
    Word(&'a str),
    Quoted(&'a str),
    OpenBracket,
}

struct Lexer<'a> {
    rest: &'a str,
}

impl<'a> Lexer<'a> {
    fn next(&mut self) -> Result<Option<Lexeme<'a>>, DomError> {
        self.rest = self.rest.trim_start();
        let Some(first) = self.rest.chars().next() else {
            return Ok(None);
        };
        match first {
            '>' => {
                self.rest = "";
                Ok(None)
            }
            '[' => {
                self.rest = &self.rest[1..];
                Ok(Some(Lexeme::OpenBracket))
            }
            '"' | '\'' => {
                let body = &self.rest[1..];
                let end = body
                    .find(first)
                    .ok_or_else(|| syntax("unterminated literal in document type"))?;
                self.rest = &body[end + 1..];
                Ok(Some(Lexeme::Quoted(&body[..end])))
            }
            _ => {
                let end = self
                    .rest
                    .find(|c: char| c.is_whitespace() || matches!(c, '[' | '>' | '"' | '\''))
                    .unwrap_or(self.rest.len());
                let word = &self.rest[..end];
                self.rest = &self.rest[end..];
                Ok(Some(Lexeme::Word(word)))
            }
        }
    }

    fn literal(&mut self, what: &str) -> Result<&'a str, DomError> {
        match self.next()? {
            Some(Lexeme::Quoted(value)) => Ok(value),
            _ => Err(syntax(format!("expected a quoted {what} in document type"))),
        }
    }
}

fn syntax(message: impl Into<String>) -> DomError {
    DomError::syntax(message, None)
}

/// Returns the text after the `DOCTYPE` keyword, or `None` if the directive
/// is something else. A leading `!` is accepted.
fn after_keyword(directive: &str) -> Option<&str> {
    let text = directive.trim_start();
    let text = text.strip_prefix('!').unwrap_or(text);
    let rest = text.strip_prefix("DOCTYPE")?;
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() || c == '[' => Some(rest),
        Some(_) => None,
    }
}

/// Parses a `DOCTYPE` directive. Returns `Ok(None)` when the directive is
/// not a document type declaration.
pub(crate) fn parse_doctype(directive: &str) -> Result<Option<DoctypeDecl<'_>>, DomError> {
    let Some(body) = after_keyword(directive) else {
        return Ok(None);
    };
    let mut lexer = Lexer { rest: body };
    let name = match lexer.next()? {
        Some(Lexeme::Word(name)) => name,
        _ => return Err(syntax("document type without a name")),
    };
    let mut decl = DoctypeDecl {
        name,
        ..DoctypeDecl::default()
    };

    let mut lexeme = lexer.next()?;
    match lexeme {
        Some(Lexeme::Word("SYSTEM")) => {
            decl.system_id = Some(lexer.literal("system identifier")?);
            lexeme = lexer.next()?;
        }
        Some(Lexeme::Word("PUBLIC")) => {
            decl.public_id = Some(lexer.literal("public identifier")?);
            lexeme = lexer.next()?;
            if let Some(Lexeme::Quoted(system)) = lexeme {
                decl.system_id = Some(system);
                lexeme = lexer.next()?;
            }
        }
        _ => {}
    }

    match lexeme {
        None => {}
        Some(Lexeme::OpenBracket) => {
            let end = lexer
                .rest
                .rfind(']')
                .ok_or_else(|| syntax("unterminated internal subset"))?;
            let trailing = lexer.rest[end + 1..].trim();
            if !trailing.is_empty() && trailing != ">" {
                return Err(syntax(format!(
                    "unexpected '{trailing}' after internal subset"
                )));
            }
            decl.internal_subset = Some(&lexer.rest[..end]);
        }
        Some(Lexeme::Word(word) | Lexeme::Quoted(word)) => {
            return Err(syntax(format!("unexpected '{word}' in document type")));
        }
    }
    Ok(Some(decl))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_internal_subset_is_verbatim() {
        let decl = parse_doctype("!DOCTYPE note [ <!ELEMENT note (to,from,heading,body)> ]")
            .unwrap()
            .unwrap();
        assert_eq!(decl.name, "note");
        assert_eq!(
            decl.internal_subset,
            Some(" <!ELEMENT note (to,from,heading,body)> ")
        );
        assert_eq!(decl.public_id, None);
    }

    #[test]
    fn test_system_and_public_ids() {
        let decl = parse_doctype(r#"DOCTYPE html SYSTEM "about:legacy-compat""#)
            .unwrap()
            .unwrap();
        assert_eq!(decl.system_id, Some("about:legacy-compat"));

        let decl = parse_doctype(
            r#"DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN" 'strict.dtd' [<!ENTITY a "b">]"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(decl.public_id, Some("-//W3C//DTD XHTML 1.0 Strict//EN"));
        assert_eq!(decl.system_id, Some("strict.dtd"));
        assert_eq!(decl.internal_subset, Some(r#"<!ENTITY a "b">"#));
    }

    #[test]
    fn test_nested_brackets_use_last_close() {
        let decl = parse_doctype("DOCTYPE r [<!-- [x] -->]>").unwrap().unwrap();
        assert_eq!(decl.internal_subset, Some("<!-- [x] -->"));
    }

    #[test]
    fn test_other_directives_are_not_doctypes() {
        assert_eq!(parse_doctype("[CDATA[x]]").unwrap(), None);
        assert_eq!(parse_doctype("DOCTYPEX r").unwrap(), None);
    }

    #[test]
    fn test_malformed_doctypes() {
        assert!(parse_doctype("DOCTYPE").is_err());
        assert!(parse_doctype("DOCTYPE r SYSTEM").is_err());
        assert!(parse_doctype("DOCTYPE r [ <!ELEMENT r ANY>").is_err());
        assert!(parse_doctype("DOCTYPE r junk").is_err());
    }
}
