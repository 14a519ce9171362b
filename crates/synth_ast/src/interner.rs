//! String interning for node type tags.
//!
//! Every tree owns one interner so that type comparisons are integer
//! comparisons and each distinct type name is stored once.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Interned string handle, valid only for the interner that produced it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Symbol(u32);

impl Symbol {
    /// Returns the raw index.
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// Append-only string interner.
#[derive(Debug, Clone, Default)]
pub struct StringInterner {
    map: FxHashMap<Arc<str>, Symbol>,
    strings: Vec<Arc<str>>,
}

impl StringInterner {
    /// Creates an empty interner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `s`, returning the existing symbol if it was seen before.
    pub fn intern(&mut self, s: &str) -> Symbol {
        if let Some(&sym) = self.map.get(s) {
            return sym;
        }
        let sym = Symbol(self.strings.len() as u32);
        let shared: Arc<str> = Arc::from(s);
        self.strings.push(Arc::clone(&shared));
        self.map.insert(shared, sym);
        sym
    }

    /// Looks up a string without interning it.
    pub fn get(&self, s: &str) -> Option<Symbol> {
        self.map.get(s).copied()
    }

    /// Resolves a symbol. Unknown symbols resolve to the empty string.
    pub fn resolve(&self, sym: Symbol) -> &str {
        self.strings
            .get(sym.0 as usize)
            .map(|s| s.as_ref())
            .unwrap_or("")
    }

    /// Resolves a symbol to its shared allocation.
    pub fn resolve_shared(&self, sym: Symbol) -> Option<Arc<str>> {
        self.strings.get(sym.0 as usize).cloned()
    }

    /// Number of distinct strings.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Returns true if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Iterates over all interned strings in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &str)> {
        self.strings
            .iter()
            .enumerate()
            .map(|(i, s)| (Symbol(i as u32), s.as_ref()))
    }
}
