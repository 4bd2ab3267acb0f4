//! The node registry: exclusive owner of AST nodes for an artifact's lifetime.

use indexmap::{IndexMap, IndexSet};

use crate::error::RegistryError;
use crate::id::NodeId;
use crate::node::{Node, NodeType};

/// Holds nodes by id with a secondary index by [`NodeType`].
#[derive(Debug, Default, Clone)]
pub struct NodeRegistry {
    nodes: IndexMap<NodeId, Node>,
    by_type: IndexMap<NodeType, IndexSet<NodeId>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node, taking ownership. Duplicate ids are an error.
    pub fn register(&mut self, node: Node) -> Result<(), RegistryError> {
        if self.nodes.contains_key(&node.id) {
            return Err(RegistryError::DuplicateNode(node.id.clone()));
        }
        self.by_type
            .entry(node.node_type())
            .or_default()
            .insert(node.id.clone());
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn has(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes, in registration order.
    pub fn get_all(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    /// Ids of all nodes with the given type, in registration order.
    ///
    /// An empty bucket yields an empty iterator without allocating.
    pub fn find_by_type(&self, node_type: NodeType) -> impl Iterator<Item = &NodeId> {
        self.by_type.get(&node_type).into_iter().flatten()
    }
}
