use serde_json::json;

use crate::{
    ConditionalNode, IdCategory, IdGenerator, Node, NodeType, Operand, Payload, PipelineNode,
    TransitionBranch, TransitionKind, TransitionNode,
};

#[test]
fn conditional_children_are_node_operands_only() {
    let mut ids = IdGenerator::new();
    let predicate = ids.next(IdCategory::CompileAst);
    let then_branch = ids.next(IdCategory::CompileAst);

    let node = Node::new(
        ids.next(IdCategory::CompileAst),
        Payload::Conditional(ConditionalNode {
            predicate: Operand::Node(predicate.clone()),
            then_value: Operand::Node(then_branch.clone()),
            else_value: Operand::Literal(json!("fallback")),
        }),
        json!(null),
    );

    let children: Vec<_> = node
        .payload
        .child_refs()
        .into_iter()
        .map(|child| (child.property, child.id.clone()))
        .collect();
    assert_eq!(
        children,
        vec![
            ("predicate".to_owned(), predicate),
            ("thenValue".to_owned(), then_branch),
        ]
    );
}

#[test]
fn pipeline_children_carry_step_indices() {
    let mut ids = IdGenerator::new();
    let input = ids.next(IdCategory::CompileAst);
    let first = ids.next(IdCategory::CompileAst);
    let second = ids.next(IdCategory::CompileAst);

    let payload = Payload::Pipeline(PipelineNode {
        input: Operand::Node(input),
        steps: vec![first, second],
    });

    let indices: Vec<_> = payload
        .child_refs()
        .into_iter()
        .map(|child| (child.property, child.index))
        .collect();
    assert_eq!(
        indices,
        vec![
            ("input".to_owned(), None),
            ("steps".to_owned(), Some(0)),
            ("steps".to_owned(), Some(1)),
        ]
    );
}

#[test]
fn transition_children_span_all_branches() {
    let mut ids = IdGenerator::new();
    let effect = ids.next(IdCategory::CompileAst);
    let outcome = ids.next(IdCategory::CompileAst);

    let payload = Payload::Transition(TransitionNode {
        kind: TransitionKind::Submit,
        when: None,
        guards: None,
        validate: true,
        always: TransitionBranch {
            effects: vec![effect],
            next: vec![],
        },
        valid: TransitionBranch {
            effects: vec![],
            next: vec![outcome],
        },
        invalid: TransitionBranch::default(),
    });

    assert_eq!(payload.node_type(), NodeType::Transition);
    let properties: Vec<_> = payload
        .child_refs()
        .into_iter()
        .map(|child| child.property)
        .collect();
    assert_eq!(properties, vec!["onAlways.effects", "onValid.next"]);
}
