//! Pipeline evaluation: left-fold of transformers over an input.

use async_trait::async_trait;

use formwork_core::{NodeId, PipelineNode};
use serde_json::Value;

use crate::context::EvaluationContext;
use crate::evaluation::Evaluation;
use crate::handler::{Handler, HandlerCore, Invoker, impl_handler_core, operand_nodes};
use crate::handlers::function::apply_function;

pub(crate) struct PipelineHandler {
    pub(crate) core: HandlerCore,
    pub(crate) data: PipelineNode,
}

#[async_trait(?Send)]
impl Handler for PipelineHandler {
    impl_handler_core!();

    fn operand_ids(&self) -> Vec<NodeId> {
        let mut ids = operand_nodes([&self.data.input]);
        ids.extend(self.data.steps.iter().cloned());
        ids
    }

    async fn evaluate(&self, ctx: &mut EvaluationContext, invoker: &Invoker<'_>) -> Evaluation {
        let input = invoker.eval_operand(&self.data.input, ctx).await;
        if input.is_error() {
            return Evaluation::undefined();
        }
        let mut current = input.value.unwrap_or(Value::Null);
        for step in &self.data.steps {
            let result = apply_function(invoker, ctx, step, current).await;
            if result.is_error() {
                // A failing step halts the whole pipeline.
                return Evaluation::undefined();
            }
            current = result.value.unwrap_or(Value::Null);
        }
        Evaluation::of(current)
    }
}
