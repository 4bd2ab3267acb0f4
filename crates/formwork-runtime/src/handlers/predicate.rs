//! Predicate composition: TEST, AND, OR, XOR, NOT.

use async_trait::async_trait;

use formwork_core::{NodeId, Operand, Payload, PredicateKind, PredicatePayload};
use serde_json::Value;

use crate::context::EvaluationContext;
use crate::evaluation::{EvalError, Evaluation};
use crate::handler::{Handler, HandlerCore, Invoker, impl_handler_core, operand_nodes};
use crate::handlers::function::apply_function;

pub(crate) struct PredicateHandler {
    pub(crate) core: HandlerCore,
    pub(crate) data: PredicatePayload,
}

#[async_trait(?Send)]
impl Handler for PredicateHandler {
    impl_handler_core!();

    fn operand_ids(&self) -> Vec<NodeId> {
        match &self.data {
            PredicatePayload::Test {
                subject, condition, ..
            } => operand_nodes([subject, condition]),
            PredicatePayload::Composite { operands, .. } => operand_nodes(operands.iter()),
            PredicatePayload::Not { operand } => operand_nodes([operand]),
        }
    }

    async fn evaluate(&self, ctx: &mut EvaluationContext, invoker: &Invoker<'_>) -> Evaluation {
        match &self.data {
            PredicatePayload::Test {
                subject,
                condition,
                negate,
            } => self.test(ctx, invoker, subject, condition, *negate).await,
            PredicatePayload::Composite { kind, operands } => {
                self.composite(ctx, invoker, *kind, operands).await
            }
            PredicatePayload::Not { operand } => {
                let inner = invoker.eval_operand(operand, ctx).await;
                // A failing operand negates to true.
                Evaluation::of(Value::Bool(!inner.is_truthy()))
            }
        }
    }
}

impl PredicateHandler {
    /// Pass the subject through the condition, then apply `negate` via XOR.
    async fn test(
        &self,
        ctx: &mut EvaluationContext,
        invoker: &Invoker<'_>,
        subject: &Operand,
        condition: &Operand,
        negate: bool,
    ) -> Evaluation {
        let subject = invoker.eval_operand(subject, ctx).await;
        if let Some(error) = subject.error {
            return Evaluation::failure(error);
        }
        let subject = subject.value.unwrap_or(Value::Null);

        let held = match condition {
            Operand::Literal(Value::Bool(flag)) => *flag,
            Operand::Literal(Value::String(name)) => {
                match self.named_condition(invoker, name, subject) {
                    Ok(flag) => flag,
                    Err(error) => return Evaluation::failure(error),
                }
            }
            Operand::Node(id) => {
                let applies_to_function = matches!(
                    invoker.engine.artifact().nodes.get(id).map(|n| &n.payload),
                    Some(Payload::Function(_))
                );
                if !applies_to_function {
                    return Evaluation::failure(EvalError::type_error(
                        &self.core.id,
                        "test condition must be a condition function",
                    ));
                }
                let result = apply_function(invoker, ctx, id, subject).await;
                if let Some(error) = result.error {
                    return Evaluation::failure(error);
                }
                result.is_truthy()
            }
            Operand::Literal(_) => {
                return Evaluation::failure(EvalError::type_error(
                    &self.core.id,
                    "test condition must be a condition function",
                ));
            }
        };
        Evaluation::of(Value::Bool(held ^ negate))
    }

    /// Resolve a bare string condition against the function registry.
    fn named_condition(
        &self,
        invoker: &Invoker<'_>,
        name: &str,
        subject: Value,
    ) -> Result<bool, EvalError> {
        match invoker.functions().get(name) {
            Some(crate::functions::Callable::Condition(f)) => f(&[subject])
                .map_err(|err| EvalError::failed(&self.core.id, err.to_string())),
            Some(_) => Err(EvalError::type_error(
                &self.core.id,
                format!("function `{name}` is not a condition"),
            )),
            None => Err(EvalError::failed(
                &self.core.id,
                format!("unknown function `{name}`"),
            )),
        }
    }

    async fn composite(
        &self,
        ctx: &mut EvaluationContext,
        invoker: &Invoker<'_>,
        kind: PredicateKind,
        operands: &[Operand],
    ) -> Evaluation {
        let mut truthy_count = 0usize;
        for operand in operands {
            let result = invoker.eval_operand(operand, ctx).await;
            if let Some(error) = result.error {
                return Evaluation::failure(error);
            }
            let truthy = result.is_truthy();
            match kind {
                PredicateKind::And if !truthy => return Evaluation::of(Value::Bool(false)),
                PredicateKind::Or if truthy => return Evaluation::of(Value::Bool(true)),
                PredicateKind::Xor if truthy => {
                    truthy_count += 1;
                    // A second truthy operand settles XOR early.
                    if truthy_count > 1 {
                        return Evaluation::of(Value::Bool(false));
                    }
                }
                _ => {}
            }
        }
        let held = match kind {
            PredicateKind::And => true,
            PredicateKind::Or => false,
            PredicateKind::Xor => truthy_count == 1,
            PredicateKind::Test | PredicateKind::Not => {
                return Evaluation::failure(EvalError::type_error(
                    &self.core.id,
                    "malformed composite predicate",
                ));
            }
        };
        Evaluation::of(Value::Bool(held))
    }
}
