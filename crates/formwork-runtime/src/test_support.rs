//! Shared fixtures for runtime tests.

use std::future::Future;
use std::sync::Arc;

use serde_json::{Value, json};

use formwork_compiler::compile_journey;
use formwork_core::{Node, NodeId};

use crate::context::EvaluationContext;
use crate::engine::StepEngine;
use crate::functions::{FunctionError, FunctionRegistry};
use crate::request::RequestInfo;

pub(crate) fn block_on<T>(future: impl Future<Output = T>) -> T {
    pollster::block_on(future)
}

pub(crate) fn test_functions() -> FunctionRegistry {
    let mut functions = FunctionRegistry::with_builtins();
    functions
        .register_effect("setData", |scope, args| {
            let key = string_arg(args, 0);
            scope.set_data(&key, args.get(1).cloned().unwrap_or(Value::Null));
            Ok(Value::Null)
        })
        .unwrap();
    functions
        .register_effect("setAnswer", |scope, args| {
            let key = string_arg(args, 0);
            scope.set_answer(&key, args.get(1).cloned().unwrap_or(Value::Null));
            Ok(Value::Null)
        })
        .unwrap();
    functions
        .register_effect("failEffect", |_scope, _args| {
            Err(FunctionError::msg("effect exploded"))
        })
        .unwrap();
    functions
}

fn string_arg(args: &[Value], index: usize) -> String {
    args.get(index)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

/// Compile a journey and build the engine for one of its steps.
pub(crate) fn engine_for(definition: Value, step_path: &str) -> StepEngine {
    engine_with(definition, step_path, test_functions())
}

pub(crate) fn engine_with(
    definition: Value,
    step_path: &str,
    functions: FunctionRegistry,
) -> StepEngine {
    let compiled = compile_journey(definition).expect("journey compiles");
    let artifact = compiled
        .step_artifact(step_path)
        .expect("step artifact exists")
        .clone();
    StepEngine::compile(artifact, Arc::new(functions))
}

pub(crate) fn ctx() -> EvaluationContext {
    EvaluationContext::new(RequestInfo::new("/test"))
}

/// First node matching a payload predicate, in registration order.
pub(crate) fn find_node(engine: &StepEngine, matches: impl Fn(&Node) -> bool) -> NodeId {
    engine
        .artifact()
        .nodes
        .ids()
        .find(|id| {
            engine
                .artifact()
                .nodes
                .get(id)
                .is_some_and(|node| matches(node))
        })
        .expect("matching node")
        .clone()
}

/// A one-step journey whose metadata holds the expression under test at key
/// `"expr"`.
pub(crate) fn expression_fixture(expression: Value) -> Value {
    json!({
        "type": "journey", "path": "/j", "code": "j", "title": "J",
        "steps": [{
            "type": "step", "path": "/s", "title": "S",
            "metadata": {"expr": expression},
        }],
    })
}

/// Evaluate the `"expr"` metadata expression of [`expression_fixture`].
pub(crate) fn eval_expression(
    definition: Value,
    ctx: &mut EvaluationContext,
) -> crate::evaluation::Evaluation {
    let engine = engine_for(definition, "/s");
    eval_expression_on(&engine, ctx)
}

pub(crate) fn eval_expression_on(
    engine: &StepEngine,
    ctx: &mut EvaluationContext,
) -> crate::evaluation::Evaluation {
    let step = engine.artifact().current_step.clone();
    let node = {
        let Some(formwork_core::Payload::Step(step)) =
            engine.artifact().nodes.get(&step).map(|n| &n.payload)
        else {
            panic!("current step payload");
        };
        match step.metadata.get("expr").expect("expr metadata") {
            formwork_core::Operand::Node(id) => id.clone(),
            formwork_core::Operand::Literal(value) => {
                return crate::evaluation::Evaluation::of(value.clone());
            }
        }
    };
    block_on(engine.invoke(&node, ctx))
}
