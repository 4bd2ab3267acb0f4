//! Pseudo-node handlers: placeholder sources for external inputs.
//!
//! Evaluating a pseudo-node reads the backing store directly. Their real
//! purpose is identity: cache invalidation cascades start at these nodes
//! when an effect writes the key they stand for.

use async_trait::async_trait;

use formwork_core::{NodeId, PseudoKind, PseudoNode};
use serde_json::Value;

use crate::context::EvaluationContext;
use crate::evaluation::Evaluation;
use crate::handler::{Handler, HandlerCore, Invoker, impl_handler_core};

pub(crate) struct PseudoHandler {
    pub(crate) core: HandlerCore,
    pub(crate) data: PseudoNode,
}

#[async_trait(?Send)]
impl Handler for PseudoHandler {
    impl_handler_core!();

    fn operand_ids(&self) -> Vec<NodeId> {
        Vec::new()
    }

    async fn evaluate(&self, ctx: &mut EvaluationContext, _invoker: &Invoker<'_>) -> Evaluation {
        let key = self.data.key.as_str();
        let value = match self.data.kind {
            PseudoKind::AnswerLocal | PseudoKind::AnswerRemote => {
                ctx.answers.current(key).cloned()
            }
            PseudoKind::Data => ctx.data.get(key).cloned(),
            PseudoKind::Post => ctx.request.post.get(key).cloned(),
            PseudoKind::Query => ctx.request.query.get(key).map(|v| Value::String(v.clone())),
            PseudoKind::Params => ctx.request.params.get(key).map(|v| Value::String(v.clone())),
        };
        Evaluation::opt(value)
    }
}
