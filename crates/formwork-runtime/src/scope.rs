//! The scope stack: key→value frames consulted innermost-first.

use std::hash::{DefaultHasher, Hash, Hasher};

use indexmap::IndexMap;
use serde_json::Value;

/// A stack of variable frames. Iteration handlers and transitions push
/// frames; reference resolution reads innermost-first.
#[derive(Debug, Clone, Default)]
pub struct ScopeStack {
    frames: Vec<IndexMap<String, Value>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: IndexMap<String, Value>) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<IndexMap<String, Value>> {
        self.frames.pop()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Innermost-first lookup of a scope key.
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(key))
    }

    /// Digest of the full stack contents, used as the scope half of cache
    /// keys. The empty stack digests to 0.
    pub fn digest(&self) -> u64 {
        if self.frames.is_empty() {
            return 0;
        }
        let mut hasher = DefaultHasher::new();
        for frame in &self.frames {
            0xf7u8.hash(&mut hasher);
            for (key, value) in frame {
                key.hash(&mut hasher);
                value.to_string().hash(&mut hasher);
            }
        }
        hasher.finish()
    }
}

/// Build a single-binding frame.
pub fn frame(key: impl Into<String>, value: Value) -> IndexMap<String, Value> {
    let mut map = IndexMap::new();
    map.insert(key.into(), value);
    map
}

/// Frame binding one sequence element: `"0"` is the element, `"index"` its
/// position.
pub fn element_frame(element: Value, index: usize) -> IndexMap<String, Value> {
    let mut map = IndexMap::new();
    map.insert("0".to_owned(), element);
    map.insert("index".to_owned(), Value::from(index as u64));
    map
}
