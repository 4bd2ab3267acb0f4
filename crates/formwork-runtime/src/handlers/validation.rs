//! Validation evaluation.
//!
//! A validation *fails* when its `when` predicate holds. A predicate that
//! cannot be evaluated also fails the validation, so authors surface their
//! own message instead of a silent pass.

use async_trait::async_trait;

use formwork_core::{NodeId, ValidationNode};
use serde::Serialize;
use serde_json::Value;

use crate::context::EvaluationContext;
use crate::evaluation::Evaluation;
use crate::handler::{Handler, HandlerCore, Invoker, impl_handler_core, operand_nodes};

const FALLBACK_MESSAGE: &str = "Validation error";

/// The evaluated record a validation produces.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub passed: bool,
    pub message: Value,
    pub submission_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

pub(crate) struct ValidationHandler {
    pub(crate) core: HandlerCore,
    pub(crate) data: ValidationNode,
}

#[async_trait(?Send)]
impl Handler for ValidationHandler {
    impl_handler_core!();

    fn operand_ids(&self) -> Vec<NodeId> {
        let mut ids = operand_nodes([&self.data.when, &self.data.message]);
        ids.extend(operand_nodes(self.data.details.iter()));
        ids
    }

    async fn evaluate(&self, ctx: &mut EvaluationContext, invoker: &Invoker<'_>) -> Evaluation {
        let when = invoker.eval_operand(&self.data.when, ctx).await;
        let message = invoker.eval_operand(&self.data.message, ctx).await;
        let message = message.ok_value().cloned().unwrap_or(Value::Null);

        if when.is_error() {
            // Predicate failure counts as validation failure, with the
            // author's message if one evaluated.
            let outcome = ValidationOutcome {
                passed: false,
                message: match message {
                    Value::Null => Value::String(FALLBACK_MESSAGE.to_owned()),
                    message => message,
                },
                submission_only: self.data.submission_only,
                details: None,
            };
            return Evaluation::of(serde_json::to_value(outcome).expect("outcome serializes"));
        }

        let details = match &self.data.details {
            Some(details) => invoker.eval_operand(details, ctx).await.ok_value().cloned(),
            None => None,
        };
        let outcome = ValidationOutcome {
            passed: !when.is_truthy(),
            message,
            submission_only: self.data.submission_only,
            details,
        };
        Evaluation::of(serde_json::to_value(outcome).expect("outcome serializes"))
    }
}
