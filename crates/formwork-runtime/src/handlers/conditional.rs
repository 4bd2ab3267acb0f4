//! Conditional evaluation.
//!
//! Errors anywhere in the conditional collapse to undefined at this
//! boundary; a broken predicate must not break the page around it.

use async_trait::async_trait;

use formwork_core::{ConditionalNode, NodeId};

use crate::context::EvaluationContext;
use crate::evaluation::Evaluation;
use crate::handler::{Handler, HandlerCore, Invoker, impl_handler_core, operand_nodes};

pub(crate) struct ConditionalHandler {
    pub(crate) core: HandlerCore,
    pub(crate) data: ConditionalNode,
}

#[async_trait(?Send)]
impl Handler for ConditionalHandler {
    impl_handler_core!();

    fn operand_ids(&self) -> Vec<NodeId> {
        operand_nodes([
            &self.data.predicate,
            &self.data.then_value,
            &self.data.else_value,
        ])
    }

    async fn evaluate(&self, ctx: &mut EvaluationContext, invoker: &Invoker<'_>) -> Evaluation {
        let predicate = invoker.eval_operand(&self.data.predicate, ctx).await;
        if predicate.is_error() {
            return Evaluation::undefined();
        }
        let branch = if predicate.is_truthy() {
            &self.data.then_value
        } else {
            &self.data.else_value
        };
        let selected = invoker.eval_operand(branch, ctx).await;
        if selected.is_error() {
            return Evaluation::undefined();
        }
        selected
    }
}
