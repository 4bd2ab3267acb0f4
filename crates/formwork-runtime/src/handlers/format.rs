//! Positional template substitution.

use async_trait::async_trait;

use formwork_core::value::to_display_string;
use formwork_core::{FormatNode, NodeId};
use serde_json::Value;

use crate::context::EvaluationContext;
use crate::evaluation::Evaluation;
use crate::handler::{Handler, HandlerCore, Invoker, impl_handler_core, operand_nodes};

pub(crate) struct FormatHandler {
    pub(crate) core: HandlerCore,
    pub(crate) data: FormatNode,
}

#[async_trait(?Send)]
impl Handler for FormatHandler {
    impl_handler_core!();

    fn operand_ids(&self) -> Vec<NodeId> {
        operand_nodes(self.data.arguments.iter())
    }

    async fn evaluate(&self, ctx: &mut EvaluationContext, invoker: &Invoker<'_>) -> Evaluation {
        let mut rendered: Vec<String> = Vec::with_capacity(self.data.arguments.len());
        for operand in &self.data.arguments {
            let result = invoker.eval_operand(operand, ctx).await;
            rendered.push(to_display_string(result.ok_value()));
        }

        let mut out = self.data.template.clone();
        // Substitute highest placeholders first so `%1` never eats `%10`.
        for (index, text) in rendered.iter().enumerate().rev() {
            out = out.replace(&format!("%{}", index + 1), text);
        }
        Evaluation::of(Value::String(out))
    }
}
