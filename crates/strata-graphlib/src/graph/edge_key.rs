//! Edge identity.
//!
//! An edge is addressed by its tail `v`, head `w`, and an optional `name` that distinguishes
//! parallel edges in a multigraph. Simple graphs drop the name; undirected graphs store the
//! endpoints in lexicographic order.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Borrowed form of [`EdgeKey`] for allocation-free lookups.
#[derive(Clone, Copy, Hash)]
pub(in crate::graph) struct EdgeKeyView<'a> {
    pub(in crate::graph) v: &'a str,
    pub(in crate::graph) w: &'a str,
    pub(in crate::graph) name: Option<&'a str>,
}

impl hashbrown::Equivalent<EdgeKey> for EdgeKeyView<'_> {
    fn equivalent(&self, key: &EdgeKey) -> bool {
        key.v == self.v && key.w == self.w && key.name.as_deref() == self.name
    }
}

#[derive(Debug, Clone, PartialOrd, Ord)]
pub struct EdgeKey {
    pub v: String,
    pub w: String,
    pub name: Option<String>,
}

impl EdgeKey {
    pub fn new(
        v: impl Into<String>,
        w: impl Into<String>,
        name: Option<impl Into<String>>,
    ) -> Self {
        Self {
            v: v.into(),
            w: w.into(),
            name: name.map(Into::into),
        }
    }

    pub fn unnamed(v: impl Into<String>, w: impl Into<String>) -> Self {
        Self {
            v: v.into(),
            w: w.into(),
            name: None,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.v == self.w
    }
}

// Field-by-field so the hash agrees with `EdgeKeyView`'s derived hash.
impl Hash for EdgeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.v.as_str().hash(state);
        self.w.as_str().hash(state);
        self.name.as_deref().hash(state);
    }
}

impl PartialEq for EdgeKey {
    fn eq(&self, other: &Self) -> bool {
        self.v == other.v && self.w == other.w && self.name == other.name
    }
}

impl Eq for EdgeKey {}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} -> {} ({name})", self.v, self.w),
            None => write!(f, "{} -> {}", self.v, self.w),
        }
    }
}
