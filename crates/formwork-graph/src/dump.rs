//! Stable text rendering of a graph, for diagnostics and snapshot tests.

use crate::graph::DependencyGraph;
use crate::overlay::OverlayGraph;

impl DependencyGraph {
    /// Render nodes and edges in insertion order.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        out.push_str("nodes:\n");
        for id in self.nodes() {
            out.push_str(&format!("  {id}\n"));
        }
        out.push_str("edges:\n");
        for edge in self.edges() {
            out.push_str(&format!("  {} -> {} [{}]\n", edge.from, edge.to, edge.meta));
        }
        out
    }
}

impl OverlayGraph {
    /// Render the union view, main first.
    pub fn dump(&self) -> String {
        self.flush_into_main().dump()
    }
}
