//! Per-step compiled artifacts.
//!
//! Each step shares the journey-wide node registry, metadata, and graph
//! through cheap overlays; only the step-specific pieces (scope flags,
//! pseudo-nodes, step wiring) are owned per step.

use std::sync::Arc;

use indexmap::IndexMap;

use formwork_core::{
    MetadataRegistry, Node, NodeId, NodeRegistry, NodeType, PseudoKind, RegistryError,
};
use formwork_graph::OverlayGraph;

use crate::traverse::NodeSource;

/// Node lookup over a shared base registry plus a per-step overlay holding
/// synthesized pseudo-nodes.
#[derive(Debug, Clone)]
pub struct ArtifactNodes {
    base: Arc<NodeRegistry>,
    overlay: NodeRegistry,
}

impl ArtifactNodes {
    pub fn new(base: Arc<NodeRegistry>) -> Self {
        Self {
            base,
            overlay: NodeRegistry::new(),
        }
    }

    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.base.get(id).or_else(|| self.overlay.get(id))
    }

    pub fn has(&self, id: &NodeId) -> bool {
        self.base.has(id) || self.overlay.has(id)
    }

    pub fn len(&self) -> usize {
        self.base.len() + self.overlay.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn base(&self) -> &NodeRegistry {
        &self.base
    }

    pub fn overlay(&self) -> &NodeRegistry {
        &self.overlay
    }

    pub fn register_overlay(&mut self, node: Node) -> Result<(), RegistryError> {
        if self.base.has(&node.id) {
            return Err(RegistryError::DuplicateNode(node.id.clone()));
        }
        self.overlay.register(node)
    }

    pub fn find_by_type(&self, node_type: NodeType) -> impl Iterator<Item = &NodeId> {
        self.base
            .find_by_type(node_type)
            .chain(self.overlay.find_by_type(node_type))
    }

    /// All ids, base first, then overlay.
    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.base.ids().chain(self.overlay.ids())
    }
}

impl NodeSource for ArtifactNodes {
    fn node(&self, id: &NodeId) -> Option<&Node> {
        self.get(id)
    }
}

/// The per-step compiled bundle the runtime consumes.
#[derive(Debug, Clone)]
pub struct StepArtifact {
    pub journey: NodeId,
    pub current_step: NodeId,
    pub step_path: String,
    pub nodes: ArtifactNodes,
    pub metadata: MetadataRegistry,
    pub graph: OverlayGraph,
    /// At most one pseudo-node per `(kind, key)` pair.
    pub pseudo_index: IndexMap<(PseudoKind, String), NodeId>,
    /// Topological order of the union graph, cached at compile time.
    pub topo: Vec<NodeId>,
}

impl StepArtifact {
    pub fn find_pseudo(&self, kind: PseudoKind, key: &str) -> Option<&NodeId> {
        self.pseudo_index.get(&(kind, key.to_owned()))
    }
}
