//! Wiring: data-flow edges from a node's operands to the node itself.
//!
//! One rule per node kind. Primitives are skipped; only operand positions
//! holding nodes produce edges. Every rule is idempotent because the graph
//! deduplicates identical edges.
//!
//! Lifecycle transition lists are deliberately not wired into their owning
//! step or journey: transitions are executed by the orchestrator, not
//! evaluated as step properties.

#[cfg(test)]
mod wiring_tests;

use formwork_core::{
    BlockKind, Node, NodeId, NodeRegistry, Operand, Payload, PredicatePayload, TransitionBranch,
};
use formwork_graph::{DependencyGraph, EdgeKind, EdgeMeta, OverlayGraph};

/// Edge sink shared by the main graph (static wiring) and per-step overlays
/// (step-scope wiring).
pub trait GraphSink {
    fn add_node(&mut self, id: NodeId);
    fn add_edge(&mut self, from: NodeId, to: NodeId, meta: EdgeMeta) -> bool;
}

impl GraphSink for DependencyGraph {
    fn add_node(&mut self, id: NodeId) {
        DependencyGraph::add_node(self, id);
    }

    fn add_edge(&mut self, from: NodeId, to: NodeId, meta: EdgeMeta) -> bool {
        DependencyGraph::add_edge(self, from, to, EdgeKind::DataFlow, meta)
    }
}

impl GraphSink for OverlayGraph {
    fn add_node(&mut self, id: NodeId) {
        OverlayGraph::add_node(self, id);
    }

    fn add_edge(&mut self, from: NodeId, to: NodeId, meta: EdgeMeta) -> bool {
        OverlayGraph::add_edge(self, from, to, EdgeKind::DataFlow, meta)
    }
}

/// Wire every step-independent rule for all registered nodes.
pub fn wire_static(registry: &NodeRegistry, graph: &mut impl GraphSink) {
    for node in registry.get_all() {
        graph.add_node(node.id.clone());
        wire_node(node, graph);
    }
    wire_validations(registry, graph);
}

/// Apply the wiring rule for one node.
pub fn wire_node(node: &Node, graph: &mut impl GraphSink) {
    let to = &node.id;
    match &node.payload {
        Payload::Journey(journey) => {
            edge(graph, &journey.title, to, "title");
            edge_opt(graph, journey.description.as_ref(), to, "description");
            for (key, operand) in &journey.metadata {
                edge(graph, operand, to, &format!("metadata.{key}"));
            }
        }
        Payload::Step(step) => {
            edge(graph, &step.title, to, "title");
            edge_opt(graph, step.description.as_ref(), to, "description");
            edge_opt(graph, step.backlink.as_ref(), to, "backlink");
            edge_ids(graph, &step.blocks, to, "blocks");
            for (key, operand) in &step.metadata {
                edge(graph, operand, to, &format!("metadata.{key}"));
            }
        }
        Payload::Block(block) => {
            edge_opt(graph, block.value.as_ref(), to, "value");
            edge_opt(graph, block.default_value.as_ref(), to, "defaultValue");
            edge_ids(graph, &block.formatters, to, "formatters");
            edge_opt(graph, block.hidden.as_ref(), to, "hidden");
            edge_ids(graph, &block.validate, to, "validate");
            edge_opt(graph, block.dependent.as_ref(), to, "dependent");
            for (key, operand) in &block.params {
                edge(graph, operand, to, &format!("params.{key}"));
            }
        }
        Payload::Reference(reference) => {
            edge_opt(graph, reference.base.as_ref(), to, "base");
        }
        Payload::Function(function) => {
            edge_operands(graph, &function.arguments, to, "arguments");
        }
        Payload::Pipeline(pipeline) => {
            edge(graph, &pipeline.input, to, "input");
            edge_ids(graph, &pipeline.steps, to, "steps");
        }
        Payload::Format(format) => {
            edge_operands(graph, &format.arguments, to, "arguments");
        }
        Payload::Iterate(iterate) => {
            edge(graph, &iterate.input, to, "input");
            edge(graph, &iterate.expression, to, "expression");
        }
        Payload::Collection(collection) => {
            edge(graph, &collection.collection, to, "collection");
            graph.add_edge(
                collection.template.clone(),
                to.clone(),
                EdgeMeta::property("template"),
            );
            edge_opt(graph, collection.fallback.as_ref(), to, "fallback");
        }
        Payload::Conditional(conditional) => {
            edge(graph, &conditional.predicate, to, "predicate");
            edge(graph, &conditional.then_value, to, "thenValue");
            edge(graph, &conditional.else_value, to, "elseValue");
        }
        Payload::Validation(validation) => {
            edge(graph, &validation.when, to, "when");
            edge(graph, &validation.message, to, "message");
            edge_opt(graph, validation.details.as_ref(), to, "details");
        }
        Payload::Next(next) => {
            edge(graph, &next.goto, to, "goto");
            edge_opt(graph, next.when.as_ref(), to, "when");
        }
        Payload::Predicate(predicate) => match predicate {
            PredicatePayload::Test {
                subject, condition, ..
            } => {
                edge(graph, subject, to, "subject");
                edge(graph, condition, to, "condition");
            }
            PredicatePayload::Composite { operands, .. } => {
                edge_operands(graph, operands, to, "operands");
            }
            PredicatePayload::Not { operand } => {
                edge(graph, operand, to, "operand");
            }
        },
        Payload::Transition(transition) => {
            edge_opt(graph, transition.when.as_ref(), to, "when");
            edge_opt(graph, transition.guards.as_ref(), to, "guards");
            wire_branch(graph, &transition.always, to, "onAlways");
            wire_branch(graph, &transition.valid, to, "onValid");
            wire_branch(graph, &transition.invalid, to, "onInvalid");
        }
        Payload::Outcome(outcome) => {
            edge_opt(graph, outcome.goto.as_ref(), to, "goto");
            edge_opt(graph, outcome.message.as_ref(), to, "message");
            edge_opt(graph, outcome.when.as_ref(), to, "when");
        }
        Payload::Pseudo(_) => {}
    }
}

/// Validations additionally feed every validating submit transition of their
/// step, so submit-time validation is visible in the graph.
fn wire_validations(registry: &NodeRegistry, graph: &mut impl GraphSink) {
    for node in registry.get_all() {
        let Payload::Step(step) = &node.payload else {
            continue;
        };
        let validating_submits: Vec<&NodeId> = step
            .on_submission
            .iter()
            .filter(|id| {
                matches!(
                    registry.get(id).map(|n| &n.payload),
                    Some(Payload::Transition(t)) if t.validate
                )
            })
            .collect();
        if validating_submits.is_empty() {
            continue;
        }
        for block_id in &step.blocks {
            let Some(Payload::Block(block)) = registry.get(block_id).map(|n| &n.payload) else {
                continue;
            };
            if block.kind != BlockKind::Field {
                continue;
            }
            for validation in &block.validate {
                for submit in &validating_submits {
                    graph.add_edge(
                        validation.clone(),
                        (*submit).clone(),
                        EdgeMeta::property("validate"),
                    );
                }
            }
        }
    }
}

/// Step-scope wiring: the final `onLoad` transition of the current step
/// feeds the step itself, so state written by load effects is ordered
/// before the step's evaluation.
pub fn wire_current_step(registry: &NodeRegistry, step_id: &NodeId, graph: &mut impl GraphSink) {
    let Some(Payload::Step(step)) = registry.get(step_id).map(|n| &n.payload) else {
        return;
    };
    if let Some(last_load) = step.on_load.last() {
        graph.add_edge(
            last_load.clone(),
            step_id.clone(),
            EdgeMeta::property("onLoad"),
        );
    }
}

fn edge(graph: &mut impl GraphSink, operand: &Operand, to: &NodeId, property: &str) {
    if let Operand::Node(from) = operand {
        graph.add_edge(from.clone(), to.clone(), EdgeMeta::property(property));
    }
}

fn edge_opt(graph: &mut impl GraphSink, operand: Option<&Operand>, to: &NodeId, property: &str) {
    if let Some(operand) = operand {
        edge(graph, operand, to, property);
    }
}

fn edge_ids(graph: &mut impl GraphSink, ids: &[NodeId], to: &NodeId, property: &str) {
    for (index, from) in ids.iter().enumerate() {
        graph.add_edge(from.clone(), to.clone(), EdgeMeta::indexed(property, index));
    }
}

fn edge_operands(graph: &mut impl GraphSink, operands: &[Operand], to: &NodeId, property: &str) {
    for (index, operand) in operands.iter().enumerate() {
        if let Operand::Node(from) = operand {
            graph.add_edge(from.clone(), to.clone(), EdgeMeta::indexed(property, index));
        }
    }
}

fn wire_branch(
    graph: &mut impl GraphSink,
    branch: &TransitionBranch,
    to: &NodeId,
    property: &str,
) {
    for (index, from) in branch.effects.iter().enumerate() {
        graph.add_edge(
            from.clone(),
            to.clone(),
            EdgeMeta::indexed(&format!("{property}.effects"), index),
        );
    }
    for (index, from) in branch.next.iter().enumerate() {
        graph.add_edge(
            from.clone(),
            to.clone(),
            EdgeMeta::indexed(&format!("{property}.next"), index),
        );
    }
}
