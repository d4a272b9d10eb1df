//! Build-time namespace scope chain.
//!
//! One frame per open element, each holding the `(prefix, uri)` bindings
//! declared on that element. A `None` prefix is the default namespace.
//! Lookups walk from the innermost frame outward, so an inner declaration
//! shadows an outer one.

use std::sync::Arc;

use super::XML_NAMESPACE;

#[derive(Debug, Clone)]
pub(crate) struct ScopeChain {
    frames: Vec<Vec<(Option<Arc<str>>, Arc<str>)>>,
}

impl ScopeChain {
    /// Creates a chain whose root frame binds the `xml` prefix.
    pub fn new() -> Self {
        let root = vec![(Some(Arc::from("xml")), Arc::from(XML_NAMESPACE))];
        Self { frames: vec![root] }
    }

    /// Opens an empty frame for an element.
    pub fn push(&mut self) {
        self.frames.push(Vec::new());
    }

    /// Closes the innermost frame. The root frame is never removed.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Number of element frames currently open.
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// Binds `prefix` (or the default namespace for `None`) in the innermost
    /// frame. An empty `uri` undeclares.
    pub fn bind(&mut self, prefix: Option<Arc<str>>, uri: Arc<str>) {
        if let Some(frame) = self.frames.last_mut() {
            frame.push((prefix, uri));
        }
    }

    /// Resolves a prefix (or the default namespace for `None`).
    pub fn resolve(&self, prefix: Option<&str>) -> Option<&Arc<str>> {
        for frame in self.frames.iter().rev() {
            for (p, uri) in frame.iter().rev() {
                if p.as_deref() == prefix {
                    return (!uri.is_empty()).then_some(uri);
                }
            }
        }
        None
    }

    /// The default namespace in scope.
    pub fn default_namespace(&self) -> Option<&Arc<str>> {
        self.resolve(None)
    }

    /// Returns `true` if `prefix` currently resolves to a namespace.
    pub fn is_bound(&self, prefix: &str) -> bool {
        self.resolve(Some(prefix)).is_some()
    }

    /// Finds a prefix that currently resolves to `uri`, innermost first.
    pub fn prefix_for(&self, uri: &str) -> Option<&Arc<str>> {
        self.frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter().rev())
            .filter_map(|(p, u)| p.as_ref().filter(|_| &**u == uri))
            .find(|p| {
                let prefix: &str = p;
                self.resolve(Some(prefix)).is_some_and(|u| &**u == uri)
            })
    }
}
