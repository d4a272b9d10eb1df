//! String interning dictionary.
//!
//! Element names, attribute names, prefixes, and namespace URIs repeat
//! heavily within a document. The `Dict` stores each distinct string once and
//! hands out shared `Arc<str>` handles, so qualified names built from the
//! same parts share storage and clone in O(1).
//!
//! A `Dict` is owned by a single [`Dom`](crate::Dom) arena; there is no
//! process-global table.

use std::collections::HashSet;
use std::sync::Arc;

/// Per-arena string table behind element and attribute names.
///
/// ```
/// use std::sync::Arc;
/// use xmldom::util::dict::Dict;
///
/// let mut dict = Dict::default();
/// let first = dict.intern("http://www.w3.org/2000/svg");
/// let again = dict.intern("http://www.w3.org/2000/svg");
/// assert!(Arc::ptr_eq(&first, &again));
/// assert_eq!(dict.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct Dict {
    strings: HashSet<Arc<str>>,
}

impl Dict {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared handle for `s`, storing it on first sight.
    pub fn intern(&mut self, s: &str) -> Arc<str> {
        match self.strings.get(s) {
            Some(existing) => Arc::clone(existing),
            None => {
                let handle: Arc<str> = Arc::from(s);
                self.strings.insert(Arc::clone(&handle));
                handle
            }
        }
    }

    pub fn intern_opt(&mut self, s: Option<&str>) -> Option<Arc<str>> {
        s.map(|s| self.intern(s))
    }

    /// Looks `s` up without storing it.
    ///
    /// A name that was never interned cannot belong to any node, so lookups
    /// can short-circuit on `None`.
    #[must_use]
    pub fn get(&self, s: &str) -> Option<Arc<str>> {
        self.strings.get(s).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
