//! Structural traversal over the lowered AST.
//!
//! Traversers walk the tree through [`ChildRef`] positions, visiting each
//! node once, and carry a breadcrumb path for diagnostics. They are the only
//! writers of node metadata.

mod parent;
mod pseudo;
mod register;
mod step_scope;

#[cfg(test)]
mod traverse_tests;

use indexmap::{IndexMap, IndexSet};

use formwork_core::{Node, NodeId, NodeRegistry};

pub use parent::assign_parents;
pub use pseudo::synthesize_pseudo_nodes;
pub use register::register_nodes;
pub use step_scope::mark_step_scope;

/// Anything that can resolve a node by id.
pub trait NodeSource {
    fn node(&self, id: &NodeId) -> Option<&Node>;
}

impl NodeSource for IndexMap<NodeId, Node> {
    fn node(&self, id: &NodeId) -> Option<&Node> {
        self.get(id)
    }
}

impl NodeSource for NodeRegistry {
    fn node(&self, id: &NodeId) -> Option<&Node> {
        self.get(id)
    }
}

/// One visited node: the node itself, its parent (if any), and the
/// breadcrumb path from the root.
pub struct WalkEntry<'a> {
    pub node: &'a Node,
    pub parent: Option<&'a NodeId>,
    pub path: String,
}

/// Depth-first pre-order walk from `root`. Each node is visited once even
/// if referenced from several positions.
pub fn walk<S: NodeSource>(source: &S, root: &NodeId, visit: &mut impl FnMut(WalkEntry<'_>)) {
    let mut visited = IndexSet::new();
    walk_inner(source, root, None, "journey", &mut visited, visit);
}

fn walk_inner<'a, S: NodeSource>(
    source: &'a S,
    id: &NodeId,
    parent: Option<&'a NodeId>,
    path: &str,
    visited: &mut IndexSet<NodeId>,
    visit: &mut impl FnMut(WalkEntry<'a>),
) {
    if !visited.insert(id.clone()) {
        return;
    }
    let Some(node) = source.node(id) else {
        return;
    };
    visit(WalkEntry {
        node,
        parent,
        path: path.to_owned(),
    });
    for child in node.payload.child_refs() {
        let child_path = match child.index {
            Some(index) => format!("{path}.{}[{index}]", child.property),
            None => format!("{path}.{}", child.property),
        };
        walk_inner(source, child.id, Some(&node.id), &child_path, visited, visit);
    }
}

/// Ids reachable from `root`, in pre-order.
pub fn reachable_ids<S: NodeSource>(source: &S, root: &NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    walk(source, root, &mut |entry| out.push(entry.node.id.clone()));
    out
}
