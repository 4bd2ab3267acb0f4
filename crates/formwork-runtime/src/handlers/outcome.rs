//! Outcome candidates: REDIRECT and THROW_ERROR, plus the NEXT expression.
//!
//! A candidate whose `when` is absent or truthy *applies*; one whose `when`
//! is falsy or fails to evaluate yields undefined, which first-match
//! iteration reads as "this branch doesn't apply".

use async_trait::async_trait;

use formwork_core::value::to_display_string;
use formwork_core::{NextNode, NodeId, OutcomeKind, OutcomeNode};
use serde_json::{Value, json};

use crate::context::EvaluationContext;
use crate::evaluation::Evaluation;
use crate::handler::{Handler, HandlerCore, Invoker, impl_handler_core, operand_nodes};

pub(crate) struct OutcomeHandler {
    pub(crate) core: HandlerCore,
    pub(crate) data: OutcomeNode,
}

#[async_trait(?Send)]
impl Handler for OutcomeHandler {
    impl_handler_core!();

    fn operand_ids(&self) -> Vec<NodeId> {
        operand_nodes(
            self.data
                .goto
                .iter()
                .chain(self.data.message.iter())
                .chain(self.data.when.iter()),
        )
    }

    async fn evaluate(&self, ctx: &mut EvaluationContext, invoker: &Invoker<'_>) -> Evaluation {
        if let Some(when) = &self.data.when {
            let applies = invoker.eval_operand(when, ctx).await;
            if !applies.is_truthy() {
                return Evaluation::undefined();
            }
        }
        match self.data.kind {
            OutcomeKind::Redirect => {
                let Some(goto) = &self.data.goto else {
                    return Evaluation::undefined();
                };
                let target = invoker.eval_operand(goto, ctx).await;
                if target.is_error() || target.value.is_none() {
                    return Evaluation::undefined();
                }
                let target = to_display_string(target.ok_value());
                Evaluation::of(json!({"type": "redirect", "value": target}))
            }
            OutcomeKind::ThrowError => {
                let message = match &self.data.message {
                    Some(message) => {
                        to_display_string(invoker.eval_operand(message, ctx).await.ok_value())
                    }
                    None => String::new(),
                };
                Evaluation::of(json!({
                    "type": "error",
                    "status": self.data.status,
                    "message": message,
                }))
            }
        }
    }
}

pub(crate) struct NextHandler {
    pub(crate) core: HandlerCore,
    pub(crate) data: NextNode,
}

#[async_trait(?Send)]
impl Handler for NextHandler {
    impl_handler_core!();

    fn operand_ids(&self) -> Vec<NodeId> {
        operand_nodes([&self.data.goto].into_iter().chain(self.data.when.iter()))
    }

    async fn evaluate(&self, ctx: &mut EvaluationContext, invoker: &Invoker<'_>) -> Evaluation {
        if let Some(when) = &self.data.when {
            let applies = invoker.eval_operand(when, ctx).await;
            if !applies.is_truthy() {
                return Evaluation::undefined();
            }
        }
        let target = invoker.eval_operand(&self.data.goto, ctx).await;
        if target.is_error() || target.value.is_none() {
            return Evaluation::undefined();
        }
        Evaluation::of(Value::String(to_display_string(target.ok_value())))
    }
}
