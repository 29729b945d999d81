//! Element registry for key-based anchor lookups
//!
//! Maps item keys to the element handles of the last committed render. The
//! registry is rebuilt after every render, so a handle never outlives the
//! element it names.

use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use scrollwatch_core::{ElementId, EngineError, Result};

use crate::host::RenderedItem;

/// Reduce an anchor selector to the item key it names
///
/// Accepts a bare key (`3`) or an attribute selector
/// (`div[data-val="3"]`, `[data-val='3']`).
pub fn selector_key(selector: &str) -> &str {
    let selector = selector.trim();
    let attribute = selector
        .rfind('[')
        .filter(|_| selector.ends_with(']'))
        .map(|open| &selector[open + 1..selector.len() - 1]);

    match attribute.and_then(|attr| attr.split_once('=')) {
        Some((_, value)) => value.trim().trim_matches(|c| c == '"' || c == '\''),
        None => selector,
    }
}

/// Registry mapping item keys to rendered elements
#[derive(Debug, Default)]
pub struct ElementRegistry {
    /// Key → element, in render order
    ids: IndexMap<Rc<str>, ElementId>,
    /// Element → key
    reverse: FxHashMap<ElementId, Rc<str>>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with the items of a new render
    pub fn rebuild(&mut self, items: &[RenderedItem]) {
        self.clear();
        for item in items {
            self.register(&item.key, item.element);
        }
        tracing::trace!(count = self.ids.len(), "element registry rebuilt");
    }

    /// Register an element under `key`
    ///
    /// A duplicate key replaces the earlier mapping (last wins) and is
    /// reported, since an anchor on that key becomes ambiguous.
    pub fn register(&mut self, key: &str, element: ElementId) {
        let key: Rc<str> = Rc::from(key);
        if let Some(previous) = self.ids.insert(key.clone(), element) {
            tracing::warn!(key = %key, "duplicate item key registered");
            self.reverse.remove(&previous);
        }
        self.reverse.insert(element, key);
    }

    pub fn get(&self, key: &str) -> Option<ElementId> {
        self.ids.get(key).copied()
    }

    /// Key of a registered element
    pub fn key_of(&self, element: ElementId) -> Option<Rc<str>> {
        self.reverse.get(&element).cloned()
    }

    /// Resolve an anchor selector to an element
    pub fn resolve(&self, selector: &str) -> Result<ElementId> {
        self.get(selector_key(selector))
            .ok_or_else(|| EngineError::SelectorMiss(selector.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.ids.contains_key(key)
    }

    /// Registered elements in render order
    pub fn iter(&self) -> impl Iterator<Item = (&Rc<str>, ElementId)> {
        self.ids.iter().map(|(key, id)| (key, *id))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.reverse.clear();
    }
}
