//! The directed data-flow multigraph.
//!
//! Nodes are referenced by [`NodeId`]; the graph never owns AST nodes.
//! Edges run from an operand to the node that consumes it, so "dependents of
//! `x`" are the nodes that must be re-evaluated when `x` changes.

use std::collections::BinaryHeap;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use formwork_core::NodeId;

/// Edge classification. All compiler-produced edges are data-flow today;
/// the tag keeps the wire format honest about what an edge means.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    DataFlow,
}

/// Which operand position produced an edge.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize)]
pub struct EdgeMeta {
    pub property: String,
    pub index: Option<usize>,
}

impl EdgeMeta {
    pub fn property(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            index: None,
        }
    }

    pub fn indexed(property: impl Into<String>, index: usize) -> Self {
        Self {
            property: property.into(),
            index: Some(index),
        }
    }
}

impl std::fmt::Display for EdgeMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}[{}]", self.property, index),
            None => write!(f, "{}", self.property),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
    pub meta: EdgeMeta,
}

/// Result of a topological sort.
///
/// On success `sort` is a permutation of all nodes with every edge source
/// preceding its target. On cycles, `cycles` lists the nodes left
/// unsortable, in insertion order, as a witness.
#[derive(Clone, Debug)]
pub struct TopoSort {
    pub sort: Vec<NodeId>,
    pub cycles: Vec<NodeId>,
    pub has_cycles: bool,
}

/// Directed multigraph of data-flow edges.
///
/// Identical edges (same endpoints, kind, and metadata) are stored once, so
/// wiring rules stay idempotent under repeated invocation.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    nodes: IndexSet<NodeId>,
    edges: IndexSet<Edge>,
    outgoing: IndexMap<NodeId, Vec<usize>>,
    incoming: IndexMap<NodeId, Vec<usize>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Idempotent.
    pub fn add_node(&mut self, id: NodeId) {
        self.nodes.insert(id);
    }

    pub fn has_node(&self, id: &NodeId) -> bool {
        self.nodes.contains(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Add an edge, inserting missing endpoints. Returns `false` when the
    /// identical edge was already present.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, kind: EdgeKind, meta: EdgeMeta) -> bool {
        self.add_node(from.clone());
        self.add_node(to.clone());
        let edge = Edge {
            from,
            to,
            kind,
            meta,
        };
        if self.edges.contains(&edge) {
            return false;
        }
        let (index, _) = self.edges.insert_full(edge);
        let edge = &self.edges[index];
        self.outgoing
            .entry(edge.from.clone())
            .or_default()
            .push(index);
        self.incoming
            .entry(edge.to.clone())
            .or_default()
            .push(index);
        true
    }

    pub fn has_edge(&self, edge: &Edge) -> bool {
        self.edges.contains(edge)
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// All edges leaving `from`, in insertion order.
    pub fn get_all_edges(&self, from: &NodeId) -> Vec<&Edge> {
        self.outgoing
            .get(from)
            .map(|indices| indices.iter().map(|&i| &self.edges[i]).collect())
            .unwrap_or_default()
    }

    pub fn edges_between(&self, from: &NodeId, to: &NodeId) -> Vec<&Edge> {
        self.get_all_edges(from)
            .into_iter()
            .filter(|edge| &edge.to == to)
            .collect()
    }

    /// Nodes that directly depend on `id` (targets of its outgoing edges).
    pub fn get_dependents(&self, id: &NodeId) -> Vec<&NodeId> {
        let mut seen = IndexSet::new();
        for edge in self.get_all_edges(id) {
            seen.insert(&edge.to);
        }
        seen.into_iter().collect()
    }

    /// Nodes `id` directly depends on (sources of its incoming edges).
    pub fn get_dependencies(&self, id: &NodeId) -> Vec<&NodeId> {
        let mut seen = IndexSet::new();
        if let Some(indices) = self.incoming.get(id) {
            for &i in indices {
                seen.insert(&self.edges[i].from);
            }
        }
        seen.into_iter().collect()
    }

    /// Kahn's algorithm with a stable tie-break: among ready nodes, the one
    /// inserted earliest sorts first, so results are reproducible.
    pub fn topological_sort(&self) -> TopoSort {
        let mut indegree = vec![0usize; self.nodes.len()];
        for edge in &self.edges {
            let target = self.nodes.get_index_of(&edge.to).expect("edge target registered");
            indegree[target] += 1;
        }

        let mut ready: BinaryHeap<std::cmp::Reverse<usize>> = indegree
            .iter()
            .enumerate()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(index, _)| std::cmp::Reverse(index))
            .collect();

        let mut sort = Vec::with_capacity(self.nodes.len());
        let mut emitted = vec![false; self.nodes.len()];
        while let Some(std::cmp::Reverse(index)) = ready.pop() {
            let id = &self.nodes[index];
            emitted[index] = true;
            sort.push(id.clone());
            if let Some(indices) = self.outgoing.get(id) {
                for &edge_index in indices {
                    let target = self
                        .nodes
                        .get_index_of(&self.edges[edge_index].to)
                        .expect("edge target registered");
                    indegree[target] -= 1;
                    if indegree[target] == 0 {
                        ready.push(std::cmp::Reverse(target));
                    }
                }
            }
        }

        let cycles: Vec<NodeId> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(index, _)| !emitted[*index])
            .map(|(_, id)| id.clone())
            .collect();
        let has_cycles = !cycles.is_empty();
        TopoSort {
            sort,
            cycles,
            has_cycles,
        }
    }

    /// Merge `other` into `self`, idempotently (node and edge set union).
    pub fn merge_from(&mut self, other: &DependencyGraph) {
        for id in other.nodes() {
            self.add_node(id.clone());
        }
        for edge in other.edges() {
            self.add_edge(
                edge.from.clone(),
                edge.to.clone(),
                edge.kind,
                edge.meta.clone(),
            );
        }
    }
}
