//! Iterators over finite sequences: MAP, FILTER, FIND.
//!
//! Each element is bound into a fresh scope frame (`"0"` is the element,
//! `"index"` its position) for the duration of the per-element expression.

use async_trait::async_trait;

use formwork_core::{IterateNode, IteratorKind, NodeId};
use serde_json::Value;

use crate::context::EvaluationContext;
use crate::evaluation::{EvalError, Evaluation};
use crate::handler::{Handler, HandlerCore, Invoker, impl_handler_core, operand_nodes};
use crate::scope::element_frame;

pub(crate) struct IterateHandler {
    pub(crate) core: HandlerCore,
    pub(crate) data: IterateNode,
}

#[async_trait(?Send)]
impl Handler for IterateHandler {
    impl_handler_core!();

    fn operand_ids(&self) -> Vec<NodeId> {
        operand_nodes([&self.data.input, &self.data.expression])
    }

    async fn evaluate(&self, ctx: &mut EvaluationContext, invoker: &Invoker<'_>) -> Evaluation {
        let input = invoker.eval_operand(&self.data.input, ctx).await;
        if input.is_error() {
            return Evaluation::undefined();
        }
        let items = match input.value {
            Some(Value::Array(items)) => items,
            None => return Evaluation::undefined(),
            Some(other) => {
                return Evaluation::failure(EvalError::type_error(
                    &self.core.id,
                    format!("iterate input must be an array, got {other}"),
                ));
            }
        };

        match self.data.iterator {
            IteratorKind::Map => {
                let mut out = Vec::with_capacity(items.len());
                for (index, element) in items.into_iter().enumerate() {
                    ctx.scope.push(element_frame(element, index));
                    let result = invoker.eval_operand(&self.data.expression, ctx).await;
                    ctx.scope.pop();
                    if result.is_error() {
                        return Evaluation::undefined();
                    }
                    out.push(result.value.unwrap_or(Value::Null));
                }
                Evaluation::of(Value::Array(out))
            }
            IteratorKind::Filter => {
                let mut out = Vec::new();
                for (index, element) in items.into_iter().enumerate() {
                    ctx.scope.push(element_frame(element.clone(), index));
                    let verdict = invoker.eval_operand(&self.data.expression, ctx).await;
                    ctx.scope.pop();
                    // A failing predicate excludes the element.
                    if verdict.is_truthy() {
                        out.push(element);
                    }
                }
                Evaluation::of(Value::Array(out))
            }
            IteratorKind::Find => {
                for (index, element) in items.into_iter().enumerate() {
                    ctx.scope.push(element_frame(element.clone(), index));
                    let verdict = invoker.eval_operand(&self.data.expression, ctx).await;
                    ctx.scope.pop();
                    if verdict.is_truthy() {
                        return Evaluation::of(element);
                    }
                }
                Evaluation::undefined()
            }
        }
    }
}
