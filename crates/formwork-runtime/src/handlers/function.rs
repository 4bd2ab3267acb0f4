//! Function invocation: transformers, conditions, and effects.

use async_trait::async_trait;

use formwork_core::{FunctionNode, FunctionRole, NodeId, Payload};
use serde_json::Value;

use crate::context::EvaluationContext;
use crate::effects::EffectScope;
use crate::evaluation::{EvalError, Evaluation};
use crate::functions::{Callable, FunctionRegistry};
use crate::handler::{Handler, HandlerCore, Invoker, impl_handler_core, operand_nodes};

pub(crate) struct FunctionHandler {
    pub(crate) core: HandlerCore,
    pub(crate) data: FunctionNode,
}

#[async_trait(?Send)]
impl Handler for FunctionHandler {
    impl_handler_core!();

    fn operand_ids(&self) -> Vec<NodeId> {
        operand_nodes(self.data.arguments.iter())
    }

    fn self_async(&self, functions: &FunctionRegistry) -> bool {
        // Unknown functions conservatively count as async.
        functions.is_async(&self.data.name).unwrap_or(true)
    }

    async fn evaluate(&self, ctx: &mut EvaluationContext, invoker: &Invoker<'_>) -> Evaluation {
        let node = &self.core.id;
        let mut args = Vec::with_capacity(self.data.arguments.len());
        for operand in &self.data.arguments {
            let arg = invoker.eval_operand(operand, ctx).await;
            if let Some(error) = arg.error {
                return Evaluation::failure(error);
            }
            args.push(arg.value.unwrap_or(Value::Null));
        }

        let Some(callable) = invoker.functions().get(&self.data.name).cloned() else {
            return Evaluation::failure(EvalError::failed(
                node,
                format!("unknown function `{}`", self.data.name),
            ));
        };

        match (self.data.role, callable) {
            (FunctionRole::Transformer, Callable::Transformer(f)) => match f(&args) {
                Ok(value) => Evaluation::of(value),
                Err(err) => Evaluation::failure(EvalError::failed(node, err.to_string())),
            },
            (FunctionRole::Condition, Callable::Condition(f)) => match f(&args) {
                Ok(flag) => Evaluation::of(Value::Bool(flag)),
                Err(err) => Evaluation::failure(EvalError::failed(node, err.to_string())),
            },
            (FunctionRole::Effect, Callable::Effect(f)) => {
                let mut scope = EffectScope::new(invoker.engine, ctx);
                match f(&mut scope, &args) {
                    Ok(value) => Evaluation::of(value),
                    Err(err) => Evaluation::failure(EvalError::failed(node, err.to_string())),
                }
            }
            (FunctionRole::Effect, Callable::AsyncEffect(f)) => {
                let mut scope = EffectScope::new(invoker.engine, ctx);
                match f(&mut scope, args).await {
                    Ok(value) => Evaluation::of(value),
                    Err(err) => Evaluation::failure(EvalError::failed(node, err.to_string())),
                }
            }
            _ => Evaluation::failure(EvalError::type_error(
                node,
                format!(
                    "function `{}` is not registered as a {:?}",
                    self.data.name, self.data.role
                ),
            )),
        }
    }
}

/// Apply a function node to an input value: the input becomes the first
/// argument, ahead of the node's own configured arguments. This is how
/// pipeline steps, formatters, and test-predicate conditions consume their
/// subject.
pub(crate) async fn apply_function(
    invoker: &Invoker<'_>,
    ctx: &mut EvaluationContext,
    function_id: &NodeId,
    input: Value,
) -> Evaluation {
    let function = match invoker
        .engine
        .artifact()
        .nodes
        .get(function_id)
        .map(|n| &n.payload)
    {
        Some(Payload::Function(function)) => function.clone(),
        _ => {
            return Evaluation::failure(EvalError::type_error(
                function_id,
                "expected a function node at this position",
            ));
        }
    };
    apply_function_payload(invoker, ctx, function_id, &function, input).await
}

async fn apply_function_payload(
    invoker: &Invoker<'_>,
    ctx: &mut EvaluationContext,
    node: &NodeId,
    function: &FunctionNode,
    input: Value,
) -> Evaluation {
    let mut args = Vec::with_capacity(function.arguments.len() + 1);
    args.push(input);
    for operand in &function.arguments {
        let arg = invoker.eval_operand(operand, ctx).await;
        if let Some(error) = arg.error {
            return Evaluation::failure(error);
        }
        args.push(arg.value.unwrap_or(Value::Null));
    }

    match invoker.functions().get(&function.name) {
        Some(Callable::Transformer(f)) => match f(&args) {
            Ok(value) => Evaluation::of(value),
            Err(err) => Evaluation::failure(EvalError::failed(node, err.to_string())),
        },
        Some(Callable::Condition(f)) => match f(&args) {
            Ok(flag) => Evaluation::of(Value::Bool(flag)),
            Err(err) => Evaluation::failure(EvalError::failed(node, err.to_string())),
        },
        Some(_) => Evaluation::failure(EvalError::type_error(
            node,
            format!("function `{}` cannot be applied to a value", function.name),
        )),
        None => Evaluation::failure(EvalError::failed(
            node,
            format!("unknown function `{}`", function.name),
        )),
    }
}
