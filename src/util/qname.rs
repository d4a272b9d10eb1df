//! `QName` (qualified name) handling.
//!
//! A qualified name is a local name with an optional namespace prefix and an
//! optional namespace URI. Its canonical string form is `prefix:local`, or
//! just `local` when there is no prefix.
//!
//! See <https://www.w3.org/TR/xml-names/#NT-QName>

use std::fmt;
use std::sync::Arc;

use super::dict::Dict;

/// Splits a `QName` into its prefix and local name parts.
///
/// Returns `(Some(prefix), localname)` if the name contains a colon,
/// or `(None, localname)` if it does not.
///
/// # Examples
///
/// ```
/// use xmldom::util::qname::split_qname;
///
/// assert_eq!(split_qname("svg:rect"), (Some("svg"), "rect"));
/// assert_eq!(split_qname("div"), (None, "div"));
/// ```
#[must_use]
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.find(':') {
        Some(pos) => (Some(&qname[..pos]), &qname[pos + 1..]),
        None => (None, qname),
    }
}

/// An immutable qualified name: local part, optional prefix, optional
/// namespace URI.
///
/// Equality compares all three parts. Two names that differ only in prefix
/// are not equal; use [`QName::same_expanded`] to compare the
/// `(namespace, local)` pair alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    local: Arc<str>,
    prefix: Option<Arc<str>>,
    namespace: Option<Arc<str>>,
}

impl QName {
    /// Builds a name from already interned parts. Empty prefixes and
    /// namespaces are treated as absent.
    #[must_use]
    pub fn new(local: Arc<str>, prefix: Option<Arc<str>>, namespace: Option<Arc<str>>) -> Self {
        Self {
            local,
            prefix: prefix.filter(|p| !p.is_empty()),
            namespace: namespace.filter(|ns| !ns.is_empty()),
        }
    }

    /// Parses `prefix:local` text and interns the parts in `dict`.
    pub fn parse(dict: &mut Dict, qualified: &str, namespace: Option<&str>) -> Self {
        let (prefix, local) = split_qname(qualified);
        Self::new(
            dict.intern(local),
            dict.intern_opt(prefix.filter(|p| !p.is_empty())),
            dict.intern_opt(namespace.filter(|ns| !ns.is_empty())),
        )
    }

    /// The local part.
    #[must_use]
    pub fn local(&self) -> &str {
        &self.local
    }

    /// The prefix, if any.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// The namespace URI, if any.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub(crate) fn local_arc(&self) -> &Arc<str> {
        &self.local
    }

    pub(crate) fn namespace_arc(&self) -> Option<&Arc<str>> {
        self.namespace.as_ref()
    }

    /// Returns a copy of this name with a different prefix.
    #[must_use]
    pub fn with_prefix(&self, prefix: Option<Arc<str>>) -> Self {
        Self::new(Arc::clone(&self.local), prefix, self.namespace.clone())
    }

    /// Returns a copy of this name with a different namespace URI.
    #[must_use]
    pub fn with_namespace(&self, namespace: Option<Arc<str>>) -> Self {
        Self::new(Arc::clone(&self.local), self.prefix.clone(), namespace)
    }

    /// Returns `true` if `qualified` is this name's canonical string form.
    #[must_use]
    pub fn matches_qualified(&self, qualified: &str) -> bool {
        match &self.prefix {
            None => *self.local == *qualified,
            Some(p) => {
                qualified.len() == p.len() + 1 + self.local.len()
                    && qualified.starts_with(&**p)
                    && qualified.as_bytes()[p.len()] == b':'
                    && qualified.ends_with(&*self.local)
            }
        }
    }

    /// Compares the expanded `(namespace, local)` pair, ignoring prefixes.
    #[must_use]
    pub fn same_expanded(&self, other: &QName) -> bool {
        self.namespace == other.namespace && self.local == other.local
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.prefix {
            write!(f, "{p}:")?;
        }
        f.write_str(&self.local)
    }
}
