use serde_json::json;

use formwork_core::{Diagnostics, IdGenerator, Operand, Payload, PredicatePayload};

use crate::factory::{Lowering, lower_journey};
use crate::normalize::{SELF_ROOT, normalize};

fn lowered_arena(
    definition: serde_json::Value,
) -> indexmap::IndexMap<formwork_core::NodeId, formwork_core::Node> {
    let mut ids = IdGenerator::new();
    let mut diagnostics = Diagnostics::new();
    let mut lowering = Lowering::new(&mut ids, &mut diagnostics);
    lower_journey(&mut lowering, &definition).expect("journey lowers");
    let mut arena = lowering.arena;
    assert!(!diagnostics.has_errors());
    normalize(&mut ids, &mut arena);
    arena
}

fn journey(steps: serde_json::Value) -> serde_json::Value {
    json!({
        "type": "journey", "path": "/j", "code": "j", "title": "J",
        "steps": steps,
    })
}

#[test]
fn field_blocks_get_a_self_reference_value() {
    let arena = lowered_arena(journey(json!([{
        "type": "step", "path": "/s", "title": "S",
        "blocks": [
            {"variant": "text-input", "code": "name"},
            {"variant": "html"},
        ],
    }])));

    let blocks: Vec<_> = arena
        .values()
        .filter_map(|node| match &node.payload {
            Payload::Block(block) => Some(block),
            _ => None,
        })
        .collect();
    let field = blocks.iter().find(|b| b.code.is_some()).unwrap();
    let basic = blocks.iter().find(|b| b.code.is_none()).unwrap();

    let value_id = field.value.as_ref().and_then(Operand::as_node).unwrap();
    let Payload::Reference(reference) = &arena[value_id].payload else {
        panic!("synthesized value must be a reference");
    };
    assert_eq!(reference.path, vec![SELF_ROOT.to_owned()]);
    // Basic blocks take no part in value synthesis.
    assert!(basic.value.is_none());
}

#[test]
fn nested_pipelines_collapse_into_one() {
    let arena = lowered_arena(journey(json!([{
        "type": "step", "path": "/s", "title": "S",
        "metadata": {"name": {
            "type": "expression", "expressionType": "pipeline",
            "input": {
                "type": "expression", "expressionType": "pipeline",
                "input": {"type": "expression", "expressionType": "reference",
                          "path": ["answers", "name"]},
                "steps": ["trim"],
            },
            "steps": ["upper"],
        }},
    }])));

    let step_node = arena
        .values()
        .find_map(|node| match &node.payload {
            Payload::Step(step) => Some(step),
            _ => None,
        })
        .unwrap();
    let outer_id = step_node
        .metadata
        .get("name")
        .and_then(Operand::as_node)
        .unwrap();
    let Payload::Pipeline(outer) = &arena[outer_id].payload else {
        panic!("not a pipeline");
    };
    // The inner pipeline's input moved up and the step lists concatenated.
    assert!(matches!(
        &arena[outer.input.as_node().unwrap()].payload,
        Payload::Reference(_)
    ));
    let names: Vec<_> = outer
        .steps
        .iter()
        .map(|id| match &arena[id].payload {
            Payload::Function(f) => f.name.clone(),
            _ => panic!("pipeline step must be a function"),
        })
        .collect();
    assert_eq!(names, vec!["trim", "upper"]);
}

#[test]
fn same_kind_composites_flatten() {
    let arena = lowered_arena(journey(json!([{
        "type": "step", "path": "/s", "title": "S",
        "metadata": {"visible": {
            "type": "predicate", "predicateType": "and",
            "operands": [
                {"type": "predicate", "predicateType": "and", "operands": [true, false]},
                true,
            ],
        }},
    }])));

    let composite = arena
        .values()
        .find_map(|node| match &node.payload {
            Payload::Predicate(PredicatePayload::Composite { kind, operands })
                if operands.len() == 3 =>
            {
                Some(*kind)
            }
            _ => None,
        })
        .expect("flattened composite of three operands");
    assert_eq!(composite, formwork_core::PredicateKind::And);
}
