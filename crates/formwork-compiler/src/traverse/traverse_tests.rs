use serde_json::json;

use formwork_core::{
    ATTACHED_TO_PARENT_NODE, Diagnostics, IS_ANCESTOR_OF_STEP, IS_CURRENT_STEP,
    IS_DESCENDANT_OF_STEP, IdGenerator, MetadataRegistry, NodeRegistry, NodeType, Payload,
    PseudoKind,
};
use formwork_graph::{DependencyGraph, OverlayGraph};

use crate::artifact::ArtifactNodes;
use crate::factory::{Lowering, lower_journey};
use crate::normalize::normalize;

use super::{assign_parents, mark_step_scope, register_nodes, synthesize_pseudo_nodes, walk};

struct Compiled {
    ids: IdGenerator,
    registry: NodeRegistry,
    metadata: MetadataRegistry,
    root: formwork_core::NodeId,
}

fn lower_and_register(definition: serde_json::Value) -> Compiled {
    let mut ids = IdGenerator::new();
    let mut diagnostics = Diagnostics::new();
    let mut lowering = Lowering::new(&mut ids, &mut diagnostics);
    let root = lower_journey(&mut lowering, &definition).expect("journey lowers");
    let mut arena = lowering.arena;
    normalize(&mut ids, &mut arena);

    let mut registry = NodeRegistry::new();
    register_nodes(&mut arena, &root, &mut registry, &mut diagnostics);
    assert!(!diagnostics.has_errors());

    let mut metadata = MetadataRegistry::new();
    assign_parents(&registry, &root, &mut metadata);
    Compiled {
        ids,
        registry,
        metadata,
        root,
    }
}

fn fixture() -> serde_json::Value {
    json!({
        "type": "journey",
        "path": "/apply",
        "code": "apply",
        "title": "Apply",
        "steps": [
            {"type": "step", "path": "/apply/name", "title": "Name", "blocks": [
                {"variant": "text-input", "code": "firstName"},
            ]},
            {"type": "step", "path": "/apply/review", "title": "Review", "blocks": [
                {"variant": "html", "content": {
                    "type": "expression", "expressionType": "reference",
                    "path": ["answers", "firstName"],
                }},
            ]},
        ],
    })
}

#[test]
fn registration_is_total_over_reachable_nodes() {
    let compiled = lower_and_register(fixture());

    let mut reachable = 0;
    walk(&compiled.registry, &compiled.root, &mut |_| reachable += 1);
    assert_eq!(reachable, compiled.registry.len());

    let steps: Vec<_> = compiled
        .registry
        .find_by_type(NodeType::Step)
        .cloned()
        .collect();
    assert_eq!(steps.len(), 2);
    for id in &steps {
        assert_eq!(
            compiled.registry.get(id).unwrap().node_type(),
            NodeType::Step
        );
    }
}

#[test]
fn every_non_root_node_has_a_parent() {
    let compiled = lower_and_register(fixture());

    walk(&compiled.registry, &compiled.root, &mut |entry| {
        if entry.node.id == compiled.root {
            assert!(compiled
                .metadata
                .get(&entry.node.id, ATTACHED_TO_PARENT_NODE)
                .is_none());
        } else {
            assert_eq!(
                compiled.metadata.parent(&entry.node.id).as_ref(),
                entry.parent,
            );
        }
    });
}

#[test]
fn step_scope_marks_current_ancestors_and_descendants() {
    let compiled = lower_and_register(fixture());
    let steps: Vec<_> = compiled
        .registry
        .find_by_type(NodeType::Step)
        .cloned()
        .collect();
    let current = &steps[0];
    let other = &steps[1];

    let mut metadata = compiled.metadata.clone();
    mark_step_scope(&compiled.registry, &mut metadata, current);

    assert!(metadata.flag(current, IS_CURRENT_STEP));
    assert!(metadata.flag(&compiled.root, IS_ANCESTOR_OF_STEP));
    assert!(!metadata.flag(other, IS_CURRENT_STEP));
    assert!(!metadata.flag(other, IS_DESCENDANT_OF_STEP));

    // The step's blocks are descendants; the step itself is not.
    let step_node = compiled.registry.get(current).unwrap();
    let Payload::Step(step) = &step_node.payload else {
        panic!("not a step");
    };
    assert!(metadata.flag(&step.blocks[0], IS_DESCENDANT_OF_STEP));
    assert!(!metadata.flag(current, IS_DESCENDANT_OF_STEP));
}

#[test]
fn pseudo_nodes_are_unique_per_kind_and_key() {
    let mut compiled = lower_and_register(fixture());
    let steps: Vec<_> = compiled
        .registry
        .find_by_type(NodeType::Step)
        .cloned()
        .collect();
    // Review step: `firstName` is not one of its own fields.
    let review = steps[1].clone();

    let base_graph = std::sync::Arc::new(DependencyGraph::new());
    let registry = std::sync::Arc::new(compiled.registry);
    let mut nodes = ArtifactNodes::new(registry.clone());
    let mut graph = OverlayGraph::new(base_graph);

    let index = synthesize_pseudo_nodes(&mut compiled.ids, &mut nodes, &mut graph, &review);

    assert_eq!(index.len(), 1);
    let pseudo_id = index
        .get(&(PseudoKind::AnswerRemote, "firstName".to_owned()))
        .expect("remote answer pseudo-node");
    let pseudo = nodes.get(pseudo_id).unwrap();
    assert_eq!(pseudo.node_type(), NodeType::Pseudo);
    // The reference depends on the pseudo source.
    assert_eq!(graph.get_dependents(pseudo_id).len(), 1);

    // Synthesizing for the owning step instead yields a local answer node.
    let name_step = steps[0].clone();
    let mut nodes = ArtifactNodes::new(registry);
    let mut graph = OverlayGraph::new(std::sync::Arc::new(DependencyGraph::new()));
    let index = synthesize_pseudo_nodes(&mut compiled.ids, &mut nodes, &mut graph, &name_step);
    let (kind, key) = index.keys().next().expect("one pseudo-node").clone();
    assert_eq!(kind, PseudoKind::AnswerLocal);
    assert_eq!(key, "firstName");
}
