//! Per-node metadata, keyed by `(node id, key)` and kept outside the nodes.
//!
//! Written by traversers during compilation, read by handlers at evaluation
//! time. Arbitrary user keys are allowed alongside the well-known ones.

use indexmap::IndexMap;
use serde_json::Value;

use crate::id::NodeId;

pub const ATTACHED_TO_PARENT_NODE: &str = "attachedToParentNode";
pub const IS_CURRENT_STEP: &str = "isCurrentStep";
pub const IS_ANCESTOR_OF_STEP: &str = "isAncestorOfStep";
pub const IS_DESCENDANT_OF_STEP: &str = "isDescendantOfStep";

#[derive(Debug, Default, Clone)]
pub struct MetadataRegistry {
    entries: IndexMap<NodeId, IndexMap<String, Value>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: &NodeId, key: impl Into<String>, value: Value) {
        self.entries
            .entry(id.clone())
            .or_default()
            .insert(key.into(), value);
    }

    pub fn get(&self, id: &NodeId, key: &str) -> Option<&Value> {
        self.entries.get(id).and_then(|keys| keys.get(key))
    }

    /// Defaulted read; returns `default` when the key was never written.
    pub fn get_or<'a>(&'a self, id: &NodeId, key: &str, default: &'a Value) -> &'a Value {
        self.get(id, key).unwrap_or(default)
    }

    pub fn flag(&self, id: &NodeId, key: &str) -> bool {
        matches!(self.get(id, key), Some(Value::Bool(true)))
    }

    /// Parent id as written by the parent-metadata traverser.
    pub fn parent(&self, id: &NodeId) -> Option<NodeId> {
        self.get(id, ATTACHED_TO_PARENT_NODE)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn set_parent(&mut self, child: &NodeId, parent: &NodeId) {
        let encoded = serde_json::to_value(parent).expect("node id serializes");
        self.set(child, ATTACHED_TO_PARENT_NODE, encoded);
    }

    /// Linear scan for nodes carrying `key == value`. Diagnostic use.
    pub fn find_nodes_where(&self, key: &str, value: &Value) -> Vec<NodeId> {
        self.entries
            .iter()
            .filter(|(_, keys)| keys.get(key) == Some(value))
            .map(|(id, _)| id.clone())
            .collect()
    }
}
