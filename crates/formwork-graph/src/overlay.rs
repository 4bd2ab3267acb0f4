//! Overlay view over a shared main graph.
//!
//! Per-step compilation and per-request evaluation both need to extend the
//! shared dependency graph without mutating it. The overlay routes all
//! writes to a private "pending" graph and answers reads from the union of
//! both, deduplicating edges that appear on both sides.

use std::sync::Arc;

use indexmap::IndexSet;

use formwork_core::NodeId;

use crate::graph::{DependencyGraph, Edge, EdgeKind, EdgeMeta, TopoSort};

#[derive(Debug, Clone)]
pub struct OverlayGraph {
    main: Arc<DependencyGraph>,
    pending: DependencyGraph,
}

impl OverlayGraph {
    pub fn new(main: Arc<DependencyGraph>) -> Self {
        Self {
            main,
            pending: DependencyGraph::new(),
        }
    }

    pub fn main(&self) -> &DependencyGraph {
        &self.main
    }

    pub fn pending(&self) -> &DependencyGraph {
        &self.pending
    }

    pub fn add_node(&mut self, id: NodeId) {
        if !self.main.has_node(&id) {
            self.pending.add_node(id);
        }
    }

    /// Add an edge to the pending graph. Edges already present in main are
    /// refused so the union never double-counts.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, kind: EdgeKind, meta: EdgeMeta) -> bool {
        let edge = Edge {
            from: from.clone(),
            to: to.clone(),
            kind,
            meta: meta.clone(),
        };
        if self.main.has_edge(&edge) {
            return false;
        }
        self.pending.add_edge(from, to, kind, meta)
    }

    pub fn has_node(&self, id: &NodeId) -> bool {
        self.main.has_node(id) || self.pending.has_node(id)
    }

    /// Union edge set between two endpoints.
    pub fn edges_between(&self, from: &NodeId, to: &NodeId) -> Vec<&Edge> {
        let mut edges = self.main.edges_between(from, to);
        edges.extend(self.pending.edges_between(from, to));
        edges
    }

    pub fn get_all_edges(&self, from: &NodeId) -> Vec<&Edge> {
        let mut edges = self.main.get_all_edges(from);
        edges.extend(self.pending.get_all_edges(from));
        edges
    }

    pub fn get_dependents(&self, id: &NodeId) -> Vec<&NodeId> {
        let mut seen: IndexSet<&NodeId> = self.main.get_dependents(id).into_iter().collect();
        seen.extend(self.pending.get_dependents(id));
        seen.into_iter().collect()
    }

    pub fn get_dependencies(&self, id: &NodeId) -> Vec<&NodeId> {
        let mut seen: IndexSet<&NodeId> = self.main.get_dependencies(id).into_iter().collect();
        seen.extend(self.pending.get_dependencies(id));
        seen.into_iter().collect()
    }

    /// Sort the union. Results are indistinguishable from sorting a freshly
    /// merged graph; cycle witnesses come from the merged view.
    pub fn topological_sort(&self) -> TopoSort {
        self.flush_into_main().topological_sort()
    }

    /// Sort only the pending nodes, in isolation from main.
    pub fn topological_sort_pending(&self) -> TopoSort {
        self.pending.topological_sort()
    }

    /// Produce the merged graph (node and edge set union). Merging is
    /// idempotent: flushing twice yields the same edge set.
    pub fn flush_into_main(&self) -> DependencyGraph {
        let mut merged = (*self.main).clone();
        merged.merge_from(&self.pending);
        merged
    }
}
