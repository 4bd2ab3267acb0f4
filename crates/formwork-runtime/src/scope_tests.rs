use serde_json::json;

use crate::scope::{ScopeStack, element_frame, frame};
use crate::test_support::{block_on, ctx, engine_for, expression_fixture, find_node};

#[test]
fn lookup_is_innermost_first() {
    let mut scope = ScopeStack::new();
    scope.push(frame("name", json!("outer")));
    scope.push(frame("name", json!("inner")));
    scope.push(frame("other", json!(1)));

    assert_eq!(scope.lookup("name"), Some(&json!("inner")));
    assert_eq!(scope.lookup("other"), Some(&json!(1)));
    assert_eq!(scope.lookup("missing"), None);

    scope.pop();
    scope.pop();
    assert_eq!(scope.lookup("name"), Some(&json!("outer")));
}

#[test]
fn digest_distinguishes_contents_and_is_stable() {
    let mut a = ScopeStack::new();
    let mut b = ScopeStack::new();
    assert_eq!(a.digest(), 0);
    assert_eq!(a.digest(), b.digest());

    a.push(frame("k", json!("v")));
    b.push(frame("k", json!("v")));
    assert_eq!(a.digest(), b.digest());
    assert_ne!(a.digest(), 0);

    b.pop();
    b.push(frame("k", json!("different")));
    assert_ne!(a.digest(), b.digest());
}

#[test]
fn element_frames_bind_element_and_index() {
    let frame = element_frame(json!("item"), 3);
    assert_eq!(frame.get("0"), Some(&json!("item")));
    assert_eq!(frame.get("index"), Some(&json!(3)));
}

#[test]
fn scope_depth_is_preserved_across_evaluation() {
    let engine = engine_for(
        expression_fixture(json!({
            "type": "expression", "expressionType": "iterate",
            "input": ["a", "b"], "iterator": "map",
            "expression": {"type": "expression", "expressionType": "reference",
                            "path": ["@scope", "0"]},
        })),
        "/s",
    );
    let mut context = ctx();
    context.scope.push(frame("ambient", json!(true)));
    let depth = context.scope.len();

    let result = crate::test_support::eval_expression_on(&engine, &mut context);

    assert_eq!(result.value, Some(json!(["a", "b"])));
    assert_eq!(context.scope.len(), depth);
}

#[test]
fn scope_depth_is_preserved_on_failing_evaluation() {
    let engine = engine_for(
        expression_fixture(json!({
            "type": "expression", "expressionType": "function",
            "name": "noSuchFunction",
        })),
        "/s",
    );
    let function = find_node(&engine, |node| {
        matches!(node.payload, formwork_core::Payload::Function(_))
    });
    let mut context = ctx();
    let depth = context.scope.len();

    let result = block_on(engine.invoke_with_scope(
        &function,
        frame("bound", json!(1)),
        &mut context,
    ));

    assert!(result.is_error());
    assert_eq!(context.scope.len(), depth);
}
