use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::BTreeMap;

/// Byte range inside the source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRange {
    pub start: u32,
    pub end: u32,
}

impl TextRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Full, heavyweight representation of a parsed structure.
///
/// This is what the parsing layer hands to the stub subsystem and what lazy
/// materialization produces again. `kind` is the element type's debug name
/// (e.g. `PROPERTY`). Source ranges and trivia only exist here, never in stubs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub kind: SmolStr,
    pub range: Option<TextRange>,
    pub attrs: BTreeMap<SmolStr, String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(kind: impl Into<SmolStr>) -> Self {
        Self {
            kind: kind.into(),
            range: None,
            attrs: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_range(mut self, range: TextRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_attr(mut self, name: impl Into<SmolStr>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Equality ignoring source ranges, which stubs never preserve.
    pub fn content_eq(&self, other: &Element) -> bool {
        self.kind == other.kind
            && self.attrs == other.attrs
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.content_eq(b))
    }

    /// Number of elements in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Element::subtree_len).sum::<usize>()
    }
}
