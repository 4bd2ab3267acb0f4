//! Parent-metadata traverser.

use formwork_core::{MetadataRegistry, NodeId, NodeRegistry};

use super::walk;

/// Record `attachedToParentNode` for every non-root node.
pub fn assign_parents(registry: &NodeRegistry, root: &NodeId, metadata: &mut MetadataRegistry) {
    walk(registry, root, &mut |entry| {
        if let Some(parent) = entry.parent {
            metadata.set_parent(&entry.node.id, parent);
        }
    });
}
