//! Registration traverser: moves lowered nodes into the node registry.

use indexmap::IndexMap;

use formwork_core::{Diagnostic, DiagnosticKind, Diagnostics, Node, NodeId, NodeRegistry};

use super::reachable_ids;

/// Move every node reachable from `root` out of the arena and into the
/// registry. Nodes orphaned by normalization stay behind and are dropped by
/// the caller with the arena.
pub fn register_nodes(
    arena: &mut IndexMap<NodeId, Node>,
    root: &NodeId,
    registry: &mut NodeRegistry,
    diagnostics: &mut Diagnostics,
) {
    for id in reachable_ids(arena, root) {
        debug_assert!(!id.to_string().is_empty());
        let Some(node) = arena.swap_remove(&id) else {
            continue;
        };
        if let Err(err) = registry.register(node) {
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::Registry,
                "journey",
                err.to_string(),
            ));
        }
    }
}
