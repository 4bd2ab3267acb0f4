use serde_json::json;

use formwork_core::{
    Diagnostics, FunctionRole, IdGenerator, NodeType, Operand, Payload, TransitionKind,
};

use super::{Lowering, lower_journey};

fn lower_ok(
    definition: serde_json::Value,
) -> (
    formwork_core::NodeId,
    indexmap::IndexMap<formwork_core::NodeId, formwork_core::Node>,
    Diagnostics,
) {
    let mut ids = IdGenerator::new();
    let mut diagnostics = Diagnostics::new();
    let mut lowering = Lowering::new(&mut ids, &mut diagnostics);
    let root = lower_journey(&mut lowering, &definition).ok();
    let arena = lowering.arena;
    let root = root.expect("journey lowers");
    (root, arena, diagnostics)
}

fn minimal_journey(steps: serde_json::Value) -> serde_json::Value {
    json!({
        "type": "journey",
        "path": "/apply",
        "code": "apply",
        "title": "Apply",
        "steps": steps,
    })
}

#[test]
fn lowered_ids_are_pairwise_distinct() {
    let (_, arena, diagnostics) = lower_ok(minimal_journey(json!([
        {"path": "/apply/name", "type": "step", "title": "Name", "blocks": [
            {"variant": "text-input", "code": "firstName"},
        ]},
    ])));

    assert!(!diagnostics.has_errors());
    let mut seen = indexmap::IndexSet::new();
    for id in arena.keys() {
        assert!(seen.insert(id.clone()), "duplicate id {id}");
    }
}

#[test]
fn conditional_branches_default_to_literals() {
    let (root, arena, _) = lower_ok(minimal_journey(json!([{
        "type": "step",
        "path": "/apply/name",
        "title": {
            "type": "expression",
            "expressionType": "conditional",
            "predicate": true,
        },
    }])));

    let conditional = arena
        .values()
        .find_map(|node| match &node.payload {
            Payload::Conditional(c) => Some(c),
            _ => None,
        })
        .expect("conditional lowered");
    assert_eq!(conditional.predicate, Operand::Literal(json!(true)));
    assert_eq!(conditional.then_value, Operand::Literal(json!(true)));
    assert_eq!(conditional.else_value, Operand::Literal(json!(false)));
    assert_eq!(arena[&root].node_type(), NodeType::Journey);
}

#[test]
fn submit_validate_is_strict_true() {
    let (_, arena, _) = lower_ok(minimal_journey(json!([{
        "type": "step",
        "path": "/a",
        "title": "A",
        "onSubmission": [
            {"validate": true},
            {"validate": "yes"},
            {},
        ],
    }])));

    let flags: Vec<bool> = arena
        .values()
        .filter_map(|node| match &node.payload {
            Payload::Transition(t) => Some(t.validate),
            _ => None,
        })
        .collect();
    assert_eq!(flags, vec![true, false, false]);
}

#[test]
fn lifecycle_position_implies_transition_kind() {
    let (_, arena, _) = lower_ok(minimal_journey(json!([{
        "type": "step",
        "path": "/a",
        "title": "A",
        "onLoad": [{}],
        "onAction": [{}],
        "onSubmission": [{}],
    }])));

    let kinds: Vec<TransitionKind> = arena
        .values()
        .filter_map(|node| match &node.payload {
            Payload::Transition(t) => Some(t.kind),
            _ => None,
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            TransitionKind::Load,
            TransitionKind::Action,
            TransitionKind::Submit,
        ]
    );
}

#[test]
fn validation_shorthand_and_defaults() {
    let (_, arena, _) = lower_ok(minimal_journey(json!([{
        "type": "step",
        "path": "/a",
        "title": "A",
        "blocks": [{
            "variant": "text-input",
            "code": "name",
            "validate": [
                {"when": {"type": "predicate", "predicateType": "test",
                          "subject": "", "condition": "isEmpty"},
                 "message": "Required"},
            ],
        }],
    }])));

    let validation = arena
        .values()
        .find_map(|node| match &node.payload {
            Payload::Validation(v) => Some(v),
            _ => None,
        })
        .expect("validation lowered");
    assert!(!validation.submission_only);
    assert_eq!(validation.message, Operand::Literal(json!("Required")));
}

#[test]
fn unrecognized_objects_pass_through_literally() {
    let (_, arena, diagnostics) = lower_ok(minimal_journey(json!([{
        "type": "step",
        "path": "/a",
        "title": "A",
        "metadata": {"theme": {"color": "green"}},
    }])));

    assert!(!diagnostics.has_errors());
    let step = arena
        .values()
        .find_map(|node| match &node.payload {
            Payload::Step(s) => Some(s),
            _ => None,
        })
        .unwrap();
    assert_eq!(
        step.metadata.get("theme"),
        Some(&Operand::Literal(json!({"color": "green"})))
    );
}

#[test]
fn missing_required_fields_are_aggregated() {
    let mut ids = IdGenerator::new();
    let mut diagnostics = Diagnostics::new();
    let mut lowering = Lowering::new(&mut ids, &mut diagnostics);
    // Two bad steps: each contributes its own diagnostic.
    let definition = minimal_journey(json!([
        {"type": "step", "title": "No path"},
        {"type": "step", "path": "/b"},
    ]));
    let root = lower_journey(&mut lowering, &definition);

    assert!(root.is_ok());
    assert_eq!(diagnostics.error_count(), 2);
}

#[test]
fn effect_shorthand_lowers_to_effect_functions() {
    let (_, arena, _) = lower_ok(minimal_journey(json!([{
        "type": "step",
        "path": "/a",
        "title": "A",
        "onSubmission": [{
            "onAlways": {"effects": [{"name": "setData", "arguments": ["goalUuid", "G1"]}]},
        }],
    }])));

    let function = arena
        .values()
        .find_map(|node| match &node.payload {
            Payload::Function(f) => Some(f),
            _ => None,
        })
        .expect("effect lowered");
    assert_eq!(function.name, "setData");
    assert_eq!(function.role, FunctionRole::Effect);
    assert_eq!(function.arguments.len(), 2);
}
