//! The compilation pipeline.
//!
//! Nine ordered phases, staged so they cannot run out of order:
//!
//! 1. transform (lower definitions to AST): [`JourneyCompiler::transform`]
//! 2. normalize: same stage
//! 3. register: [`TransformedJourney::analyze`]
//! 4. parent metadata: same stage
//! 5. static wiring: same stage
//! 6. step-scope metadata, per step on an overlay: [`AnalyzedJourney::finish`]
//! 7. pseudo-node synthesis: same stage
//! 8. step-scope wiring: same stage
//! 9. handler compilation, owned by the runtime, which consumes the
//!    [`StepArtifact`]s produced here and instantiates handlers in the
//!    cached topological order.
//!
//! Diagnostics accumulate across phases; an error anywhere prevents artifact
//! construction but not the discovery of further problems.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use formwork_core::{
    Diagnostic, DiagnosticKind, Diagnostics, IdGenerator, MetadataRegistry, Node, NodeId,
    NodeRegistry, NodeType, Payload,
};
use formwork_graph::{DependencyGraph, OverlayGraph};

use crate::artifact::{ArtifactNodes, StepArtifact};
use crate::factory::{Lowering, lower_journey};
use crate::normalize::normalize;
use crate::traverse::{
    assign_parents, mark_step_scope, register_nodes, synthesize_pseudo_nodes, walk,
};
use crate::wiring::{wire_current_step, wire_static};

/// Entry point: a journey definition about to be compiled.
pub struct JourneyCompiler {
    definition: Value,
}

impl JourneyCompiler {
    pub fn new(definition: Value) -> Self {
        Self { definition }
    }

    /// Phases 1–2: lower the definition tree and normalize the result.
    pub fn transform(self) -> TransformedJourney {
        let mut ids = IdGenerator::new();
        let mut diagnostics = Diagnostics::new();

        debug!("phase 1: transform");
        let mut lowering = Lowering::new(&mut ids, &mut diagnostics);
        let root = lower_journey(&mut lowering, &self.definition).ok();
        let mut arena = lowering.arena;

        debug!("phase 2: normalize");
        normalize(&mut ids, &mut arena);

        TransformedJourney {
            ids,
            arena,
            root,
            diagnostics,
        }
    }
}

/// Output of phases 1–2.
pub struct TransformedJourney {
    ids: IdGenerator,
    arena: IndexMap<NodeId, Node>,
    root: Option<NodeId>,
    diagnostics: Diagnostics,
}

impl TransformedJourney {
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn root(&self) -> Option<&NodeId> {
        self.root.as_ref()
    }

    /// Phases 3–5: registration, parent metadata, and static wiring.
    pub fn analyze(mut self) -> AnalyzedJourney {
        let mut registry = NodeRegistry::new();
        let mut metadata = MetadataRegistry::new();
        let mut graph = DependencyGraph::new();

        if let Some(root) = &self.root {
            debug!("phase 3: register");
            register_nodes(&mut self.arena, root, &mut registry, &mut self.diagnostics);

            debug!("phase 4: parent metadata");
            assign_parents(&registry, root, &mut metadata);

            debug!("phase 5: static wiring");
            wire_static(&registry, &mut graph);

            check_consistency(&registry, root, &mut self.diagnostics);
        }

        AnalyzedJourney {
            ids: self.ids,
            registry: Arc::new(registry),
            metadata,
            graph: Arc::new(graph),
            root: self.root,
            diagnostics: self.diagnostics,
        }
    }
}

/// Output of phases 3–5: the shared compilation every step overlays.
pub struct AnalyzedJourney {
    ids: IdGenerator,
    registry: Arc<NodeRegistry>,
    metadata: MetadataRegistry,
    graph: Arc<DependencyGraph>,
    root: Option<NodeId>,
    diagnostics: Diagnostics,
}

impl AnalyzedJourney {
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Phases 6–8, once per step. Cycles or accumulated errors prevent
    /// artifact construction.
    pub fn finish(mut self) -> Result<CompiledJourney, Diagnostics> {
        let Some(root) = self.root.clone() else {
            return Err(self.diagnostics);
        };

        let mut steps = IndexMap::new();
        for (step_id, step_path) in collect_steps(&self.registry, &root) {
            debug!(step = %step_path, "phase 6: step-scope metadata");
            let mut metadata = self.metadata.clone();
            mark_step_scope(&self.registry, &mut metadata, &step_id);

            debug!(step = %step_path, "phase 7: pseudo-nodes");
            let mut nodes = ArtifactNodes::new(self.registry.clone());
            let mut graph = OverlayGraph::new(self.graph.clone());
            let pseudo_index =
                synthesize_pseudo_nodes(&mut self.ids, &mut nodes, &mut graph, &step_id);

            debug!(step = %step_path, "phase 8: step-scope wiring");
            wire_current_step(&self.registry, &step_id, &mut graph);

            let sorted = graph.topological_sort();
            if sorted.has_cycles {
                let witnesses: Vec<String> =
                    sorted.cycles.iter().map(ToString::to_string).collect();
                self.diagnostics.push(Diagnostic::error(
                    DiagnosticKind::Cycle,
                    format!("journey.steps.{step_path}"),
                    format!("dependency cycle between nodes: {}", witnesses.join(", ")),
                ));
                continue;
            }

            steps.insert(
                step_path.clone(),
                StepArtifact {
                    journey: root.clone(),
                    current_step: step_id,
                    step_path,
                    nodes,
                    metadata,
                    graph,
                    pseudo_index,
                    topo: sorted.sort,
                },
            );
        }

        if self.diagnostics.has_errors() {
            return Err(self.diagnostics);
        }
        Ok(CompiledJourney {
            journey: root,
            steps,
            diagnostics: self.diagnostics,
        })
    }
}

/// The fully compiled journey: one artifact per step, sharing a base.
#[derive(Debug)]
pub struct CompiledJourney {
    pub journey: NodeId,
    pub steps: IndexMap<String, StepArtifact>,
    /// Warnings that survived compilation.
    pub diagnostics: Diagnostics,
}

impl CompiledJourney {
    pub fn step_artifact(&self, path: &str) -> Option<&StepArtifact> {
        self.steps.get(path)
    }

    pub fn step_paths(&self) -> impl Iterator<Item = &String> {
        self.steps.keys()
    }
}

/// Run all phases in order.
pub fn compile_journey(definition: Value) -> Result<CompiledJourney, Diagnostics> {
    JourneyCompiler::new(definition)
        .transform()
        .analyze()
        .finish()
}

/// All steps reachable from the journey, with their paths, in tree order.
fn collect_steps(registry: &NodeRegistry, root: &NodeId) -> Vec<(NodeId, String)> {
    let mut steps = Vec::new();
    walk(registry, root, &mut |entry| {
        if let Payload::Step(step) = &entry.node.payload {
            steps.push((entry.node.id.clone(), step.path.clone()));
        }
    });
    steps
}

/// Journey-level consistency rules, aggregate-reported.
fn check_consistency(registry: &NodeRegistry, root: &NodeId, diagnostics: &mut Diagnostics) {
    // Field codes must be unique within their step.
    for step_id in registry.find_by_type(NodeType::Step) {
        let Some(Payload::Step(step)) = registry.get(step_id).map(|n| &n.payload) else {
            continue;
        };
        let mut seen = indexmap::IndexSet::new();
        for block_id in &step.blocks {
            if let Some(Payload::Block(block)) = registry.get(block_id).map(|n| &n.payload)
                && let Some(code) = &block.code
                && !seen.insert(code.clone())
            {
                diagnostics.push(Diagnostic::error(
                    DiagnosticKind::Consistency,
                    format!("journey.steps.{}", step.path),
                    format!("duplicate field code `{code}` within step"),
                ));
            }
        }
    }

    // A journey's entry path must resolve to one of its descendant steps.
    let mut journeys = Vec::new();
    walk(registry, root, &mut |entry| {
        if let Payload::Journey(journey) = &entry.node.payload
            && let Some(entry_path) = &journey.entry_path
        {
            journeys.push((entry.node.id.clone(), journey.path.clone(), entry_path.clone()));
        }
    });
    for (journey_id, journey_path, entry_path) in journeys {
        let descendant_paths: Vec<String> = collect_steps(registry, &journey_id)
            .into_iter()
            .map(|(_, path)| path)
            .collect();
        if !descendant_paths.iter().any(|path| path == &entry_path) {
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::Consistency,
                format!("journey `{journey_path}`"),
                format!("entryPath `{entry_path}` does not resolve to a descendant step"),
            ));
        }
    }
}
