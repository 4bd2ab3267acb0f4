use serde_json::json;

use formwork_core::{Diagnostics, IdGenerator, NodeRegistry, NodeType, Payload};
use formwork_graph::DependencyGraph;

use crate::factory::{Lowering, lower_journey};
use crate::normalize::normalize;
use crate::traverse::register_nodes;

use super::wire_static;

fn registry_for(definition: serde_json::Value) -> (NodeRegistry, formwork_core::NodeId) {
    let mut ids = IdGenerator::new();
    let mut diagnostics = Diagnostics::new();
    let mut lowering = Lowering::new(&mut ids, &mut diagnostics);
    let root = lower_journey(&mut lowering, &definition).expect("journey lowers");
    let mut arena = lowering.arena;
    normalize(&mut ids, &mut arena);
    let mut registry = NodeRegistry::new();
    register_nodes(&mut arena, &root, &mut registry, &mut diagnostics);
    assert!(!diagnostics.has_errors());
    (registry, root)
}

fn journey(steps: serde_json::Value) -> serde_json::Value {
    json!({
        "type": "journey", "path": "/j", "code": "j", "title": "J",
        "steps": steps,
    })
}

#[test]
fn conditional_operands_wire_into_the_conditional() {
    let (registry, _) = registry_for(journey(json!([{
        "type": "step", "path": "/s", "title": "S",
        "metadata": {"greeting": {
            "type": "expression", "expressionType": "conditional",
            "predicate": {"type": "predicate", "predicateType": "test",
                          "subject": {"type": "expression", "expressionType": "reference",
                                      "path": ["answers", "isAdmin"]},
                          "condition": "truthy"},
            "thenValue": "Admin",
            "elseValue": "User",
        }},
    }])));
    let mut graph = DependencyGraph::new();

    wire_static(&registry, &mut graph);

    let conditional = registry
        .get_all()
        .find(|n| matches!(n.payload, Payload::Conditional(_)))
        .unwrap();
    let deps = graph.get_dependencies(&conditional.id);
    // Literal branches produce no edges; only the predicate node does.
    assert_eq!(deps.len(), 1);
    let predicate = registry
        .get_all()
        .find(|n| matches!(n.payload, Payload::Predicate(_)))
        .unwrap();
    assert_eq!(deps[0], &predicate.id);
}

#[test]
fn pipeline_steps_are_indexed_edges() {
    let (registry, _) = registry_for(journey(json!([{
        "type": "step", "path": "/s", "title": "S",
        "metadata": {"name": {
            "type": "expression", "expressionType": "pipeline",
            "input": {"type": "expression", "expressionType": "reference",
                      "path": ["answers", "name"]},
            "steps": ["trim", "upper"],
        }},
    }])));
    let mut graph = DependencyGraph::new();

    wire_static(&registry, &mut graph);

    let pipeline = registry
        .get_all()
        .find(|n| matches!(n.payload, Payload::Pipeline(_)))
        .unwrap();
    let Payload::Pipeline(payload) = &pipeline.payload else {
        unreachable!();
    };
    for (index, step) in payload.steps.iter().enumerate() {
        let edges = graph.edges_between(step, &pipeline.id);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].meta.property, "steps");
        assert_eq!(edges[0].meta.index, Some(index));
    }
}

#[test]
fn validations_feed_validating_submit_transitions() {
    let (registry, _) = registry_for(journey(json!([{
        "type": "step", "path": "/s", "title": "S",
        "blocks": [{
            "variant": "text-input", "code": "name",
            "validate": [{"when": {"type": "predicate", "predicateType": "test",
                                   "subject": {"type": "expression",
                                               "expressionType": "reference",
                                               "path": ["@self"]},
                                   "condition": "isEmpty"},
                          "message": "Required"}],
        }],
        "onSubmission": [
            {"validate": true},
            {"validate": false},
        ],
    }])));
    let mut graph = DependencyGraph::new();

    wire_static(&registry, &mut graph);

    let validation = registry
        .get_all()
        .find(|n| matches!(n.payload, Payload::Validation(_)))
        .unwrap();
    let submits: Vec<_> = registry
        .get_all()
        .filter_map(|n| match &n.payload {
            Payload::Transition(t) => Some((n.id.clone(), t.validate)),
            _ => None,
        })
        .collect();
    let dependents = graph.get_dependents(&validation.id);
    for (submit_id, validates) in submits {
        let wired = dependents.contains(&&submit_id);
        assert_eq!(wired, validates, "validation wiring must track `validate`");
    }
}

#[test]
fn wiring_is_idempotent() {
    let (registry, _) = registry_for(journey(json!([{
        "type": "step", "path": "/s", "title": "S",
        "blocks": [{"variant": "text-input", "code": "name"}],
    }])));
    let mut graph = DependencyGraph::new();

    wire_static(&registry, &mut graph);
    let first_edges = graph.edge_count();
    let first_nodes = graph.node_count();
    wire_static(&registry, &mut graph);

    assert_eq!(graph.edge_count(), first_edges);
    assert_eq!(graph.node_count(), first_nodes);
}

#[test]
fn every_registered_node_lands_in_the_graph() {
    let (registry, _) = registry_for(journey(json!([{
        "type": "step", "path": "/s", "title": "S",
        "blocks": [{"variant": "text-input", "code": "name"}],
    }])));
    let mut graph = DependencyGraph::new();

    wire_static(&registry, &mut graph);

    assert_eq!(graph.node_count(), registry.len());
    for id in registry.find_by_type(NodeType::Block) {
        assert!(graph.has_node(id));
    }
}
