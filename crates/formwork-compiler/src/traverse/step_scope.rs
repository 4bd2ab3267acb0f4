//! Step-scope traverser.
//!
//! Given the step a request is for, marks the step itself, its ancestor
//! chain, and its subtree. Handlers read these flags to decide which
//! property set to evaluate.

use serde_json::Value;

use formwork_core::{
    IS_ANCESTOR_OF_STEP, IS_CURRENT_STEP, IS_DESCENDANT_OF_STEP, MetadataRegistry, NodeId,
    NodeRegistry,
};

use super::walk;

pub fn mark_step_scope(registry: &NodeRegistry, metadata: &mut MetadataRegistry, step: &NodeId) {
    metadata.set(step, IS_CURRENT_STEP, Value::Bool(true));

    let mut current = metadata.parent(step);
    while let Some(ancestor) = current {
        metadata.set(&ancestor, IS_ANCESTOR_OF_STEP, Value::Bool(true));
        current = metadata.parent(&ancestor);
    }

    let mut descendants = Vec::new();
    walk(registry, step, &mut |entry| {
        if &entry.node.id != step {
            descendants.push(entry.node.id.clone());
        }
    });
    for descendant in descendants {
        metadata.set(&descendant, IS_DESCENDANT_OF_STEP, Value::Bool(true));
    }
}
