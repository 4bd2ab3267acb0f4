use serde_json::json;

use formwork_core::{DiagnosticKind, NodeType, Payload};

use crate::pipeline::compile_journey;

fn fixture() -> serde_json::Value {
    json!({
        "type": "journey",
        "path": "/apply",
        "code": "apply",
        "title": "Apply",
        "entryPath": "/apply/name",
        "steps": [
            {"type": "step", "path": "/apply/name", "title": "Name",
             "isEntryPoint": true,
             "blocks": [{"variant": "text-input", "code": "firstName"}]},
            {"type": "step", "path": "/apply/review", "title": "Review",
             "blocks": [{"variant": "html", "content": {
                 "type": "expression", "expressionType": "reference",
                 "path": ["answers", "firstName"],
             }}]},
        ],
    })
}

#[test]
fn compilation_produces_one_artifact_per_step() {
    let compiled = compile_journey(fixture()).expect("compiles");

    let paths: Vec<_> = compiled.step_paths().cloned().collect();
    assert_eq!(paths, vec!["/apply/name", "/apply/review"]);

    let artifact = compiled.step_artifact("/apply/name").unwrap();
    assert_eq!(artifact.step_path, "/apply/name");
    assert!(artifact.metadata.flag(
        &artifact.current_step,
        formwork_core::IS_CURRENT_STEP
    ));
    // The topological order covers every node in the union graph.
    assert_eq!(
        artifact.topo.len(),
        artifact.graph.flush_into_main().node_count()
    );
}

#[test]
fn double_compilation_is_equivalent_modulo_ids() {
    let first = compile_journey(fixture()).expect("compiles");
    let second = compile_journey(fixture()).expect("compiles");

    let describe = |compiled: &crate::pipeline::CompiledJourney| -> Vec<(String, usize, Vec<NodeType>)> {
        compiled
            .steps
            .values()
            .map(|artifact| {
                let mut types: Vec<NodeType> = artifact
                    .nodes
                    .ids()
                    .map(|id| artifact.nodes.get(id).unwrap().node_type())
                    .collect();
                types.sort_by_key(|t| format!("{t:?}"));
                (
                    artifact.step_path.clone(),
                    artifact.graph.flush_into_main().edge_count(),
                    types,
                )
            })
            .collect()
    };

    assert_eq!(describe(&first), describe(&second));
}

#[test]
fn factory_output_is_acyclic_even_with_mutual_answer_references() {
    // Two fields whose values reference each other's answers. Data-wise this
    // loops, but the graph routes both through pseudo sources, so the
    // artifact stays acyclic and the self-reference is a scope concern.
    let definition = json!({
        "type": "journey", "path": "/j", "code": "j", "title": "J",
        "steps": [{
            "type": "step", "path": "/s", "title": "S",
            "blocks": [
                {"variant": "text-input", "code": "a",
                 "value": {"type": "expression", "expressionType": "reference",
                            "path": ["answers", "b"]}},
                {"variant": "text-input", "code": "b",
                 "value": {"type": "expression", "expressionType": "reference",
                            "path": ["answers", "a"]}},
            ],
        }],
    });

    let compiled = compile_journey(definition).expect("compiles");
    let artifact = compiled.step_artifact("/s").unwrap();
    assert!(!artifact.graph.topological_sort().has_cycles);
}

#[test]
fn unresolved_entry_path_is_a_consistency_error() {
    let mut definition = fixture();
    definition["entryPath"] = json!("/apply/missing");

    let err = compile_journey(definition).expect_err("must fail");

    assert!(err.has_errors());
    assert!(err
        .iter()
        .any(|d| d.kind == DiagnosticKind::Consistency && d.message.contains("/apply/missing")));
}

#[test]
fn duplicate_field_codes_are_rejected() {
    let definition = json!({
        "type": "journey", "path": "/j", "code": "j", "title": "J",
        "steps": [{
            "type": "step", "path": "/s", "title": "S",
            "blocks": [
                {"variant": "text-input", "code": "dup"},
                {"variant": "radio-group", "code": "dup"},
            ],
        }],
    });

    let err = compile_journey(definition).expect_err("must fail");

    assert!(err.iter().any(|d| d.message.contains("duplicate field code")));
}

#[test]
fn pseudo_index_is_per_artifact() {
    let compiled = compile_journey(fixture()).expect("compiles");

    let name = compiled.step_artifact("/apply/name").unwrap();
    let review = compiled.step_artifact("/apply/review").unwrap();

    // `firstName` is local to the name step, remote for the review step.
    assert!(name
        .find_pseudo(formwork_core::PseudoKind::AnswerLocal, "firstName")
        .is_some());
    assert!(review
        .find_pseudo(formwork_core::PseudoKind::AnswerRemote, "firstName")
        .is_some());

    // Pseudo-nodes live in the overlay, not the shared base.
    assert_eq!(name.nodes.base().len(), review.nodes.base().len());
    assert_eq!(name.nodes.overlay().len(), 1);
    let pseudo_id = name
        .find_pseudo(formwork_core::PseudoKind::AnswerLocal, "firstName")
        .unwrap();
    let Payload::Pseudo(pseudo) = &name.nodes.get(pseudo_id).unwrap().payload else {
        panic!("pseudo payload expected");
    };
    assert!(pseudo.field.is_some());
}
