//! Error types for tree mutation, namespace processing, and tree construction.
//!
//! Every fallible operation in the crate returns a [`DomError`]. The error
//! carries a [`DomErrorKind`] that mirrors the DOM exception names, the name
//! of the operation that failed, a human-readable message, and (for errors
//! raised while building from markup) the source location of the offending
//! token.
//!
//! Programmer errors, such as inserting a node owned by another document
//! without adopting it first, are not represented here: they panic.

use std::fmt;

/// The category of a [`DomError`], matching the DOM exception names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomErrorKind {
    /// A node was inserted somewhere it may not appear.
    HierarchyRequest,
    /// A reference node is not a child of the stated parent, or a removal
    /// target is not owned by the node it is removed from.
    NotFound,
    /// A namespace prefix is unbound or bound inconsistently.
    Namespace,
    /// An attribute node is already owned by another element.
    InUseAttribute,
    /// The markup is malformed.
    Syntax,
}

impl DomErrorKind {
    /// Returns the DOM exception name for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HierarchyRequest => "HierarchyRequestError",
            Self::NotFound => "NotFoundError",
            Self::Namespace => "NamespaceError",
            Self::InUseAttribute => "InUseAttributeError",
            Self::Syntax => "SyntaxError",
        }
    }
}

impl fmt::Display for DomErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source location within markup input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The error type returned by every fallible operation in the crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomError {
    /// What went wrong.
    pub kind: DomErrorKind,
    /// The operation that raised the error (e.g. `"insert_before"`).
    pub operation: &'static str,
    /// Human-readable detail.
    pub message: String,
    /// Where in the markup the error occurred, for build errors.
    pub location: Option<SourceLocation>,
}

impl DomError {
    /// Creates an error of the given kind without a source location.
    pub fn new(kind: DomErrorKind, operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            operation,
            message: message.into(),
            location: None,
        }
    }

    pub(crate) fn hierarchy(operation: &'static str, message: impl Into<String>) -> Self {
        Self::new(DomErrorKind::HierarchyRequest, operation, message)
    }

    pub(crate) fn not_found(operation: &'static str, message: impl Into<String>) -> Self {
        Self::new(DomErrorKind::NotFound, operation, message)
    }

    pub(crate) fn namespace(operation: &'static str, message: impl Into<String>) -> Self {
        Self::new(DomErrorKind::Namespace, operation, message)
    }

    pub(crate) fn in_use_attribute(operation: &'static str, message: impl Into<String>) -> Self {
        Self::new(DomErrorKind::InUseAttribute, operation, message)
    }

    pub(crate) fn syntax(message: impl Into<String>, location: Option<SourceLocation>) -> Self {
        Self {
            kind: DomErrorKind::Syntax,
            operation: "parse",
            message: message.into(),
            location,
        }
    }

    /// Attaches a source location unless one is already present.
    #[must_use]
    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location.get_or_insert(location);
        self
    }
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.operation, self.kind, self.message)?;
        if let Some(loc) = self.location {
            write!(f, " at {loc}")?;
        }
        Ok(())
    }
}

impl std::error::Error for DomError {}
