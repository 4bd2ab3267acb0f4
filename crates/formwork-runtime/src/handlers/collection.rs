//! Collection rendering: one block-template instantiation per element.

use async_trait::async_trait;

use formwork_core::{CollectionNode, NodeId};
use serde_json::Value;

use crate::context::EvaluationContext;
use crate::evaluation::{EvalError, Evaluation};
use crate::handler::{Handler, HandlerCore, Invoker, impl_handler_core, operand_nodes};
use crate::scope::element_frame;

pub(crate) struct CollectionHandler {
    pub(crate) core: HandlerCore,
    pub(crate) data: CollectionNode,
}

#[async_trait(?Send)]
impl Handler for CollectionHandler {
    impl_handler_core!();

    fn operand_ids(&self) -> Vec<NodeId> {
        let mut ids = operand_nodes([&self.data.collection]);
        ids.push(self.data.template.clone());
        ids.extend(operand_nodes(self.data.fallback.iter()));
        ids
    }

    async fn evaluate(&self, ctx: &mut EvaluationContext, invoker: &Invoker<'_>) -> Evaluation {
        let collection = invoker.eval_operand(&self.data.collection, ctx).await;
        if collection.is_error() {
            return Evaluation::undefined();
        }
        let items = match collection.value {
            Some(Value::Array(items)) => items,
            None | Some(Value::Null) => Vec::new(),
            Some(other) => {
                return Evaluation::failure(EvalError::type_error(
                    &self.core.id,
                    format!("collection input must be an array, got {other}"),
                ));
            }
        };

        if items.is_empty() {
            return match &self.data.fallback {
                Some(fallback) => invoker.eval_operand(fallback, ctx).await,
                None => Evaluation::of(Value::Array(Vec::new())),
            };
        }

        let mut rendered = Vec::with_capacity(items.len());
        for (index, element) in items.into_iter().enumerate() {
            ctx.scope.push(element_frame(element, index));
            let record = invoker.invoke(&self.data.template, ctx).await;
            ctx.scope.pop();
            if let Some(error) = record.error {
                return Evaluation::failure(error);
            }
            rendered.push(record.value.unwrap_or(Value::Null));
        }
        Evaluation::of(Value::Array(rendered))
    }
}
