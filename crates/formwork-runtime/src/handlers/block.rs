//! Block evaluation.
//!
//! Emits the evaluated block record the component renderer consumes. Field
//! blocks bind `@self` to their current value (answer, falling back to the
//! default) around everything they evaluate, validations included.

use async_trait::async_trait;

use formwork_core::{BlockKind, BlockNode, NodeId, Operand};
use serde_json::{Map, Value};

use crate::context::EvaluationContext;
use crate::evaluation::Evaluation;
use crate::handler::{Handler, HandlerCore, Invoker, impl_handler_core, operand_nodes};
use crate::handlers::function::apply_function;

pub(crate) struct BlockHandler {
    pub(crate) core: HandlerCore,
    pub(crate) data: BlockNode,
}

#[async_trait(?Send)]
impl Handler for BlockHandler {
    impl_handler_core!();

    fn operand_ids(&self) -> Vec<NodeId> {
        let mut ids = operand_nodes(
            self.data
                .value
                .iter()
                .chain(self.data.default_value.iter())
                .chain(self.data.hidden.iter())
                .chain(self.data.dependent.iter())
                .chain(self.data.params.values()),
        );
        ids.extend(self.data.formatters.iter().cloned());
        ids.extend(self.data.validate.iter().cloned());
        ids
    }

    async fn evaluate(&self, ctx: &mut EvaluationContext, invoker: &Invoker<'_>) -> Evaluation {
        let mut record = Map::new();
        record.insert("variant".to_owned(), Value::String(self.data.variant.clone()));

        if self.data.kind == BlockKind::Field {
            self.evaluate_field(&mut record, ctx, invoker).await;
        }

        for (key, operand) in &self.data.params {
            let value = invoker.eval_operand(operand, ctx).await;
            record.insert(key.clone(), value.ok_value().cloned().unwrap_or(Value::Null));
        }

        Evaluation::of(Value::Object(record))
    }
}

impl BlockHandler {
    async fn evaluate_field(
        &self,
        record: &mut Map<String, Value>,
        ctx: &mut EvaluationContext,
        invoker: &Invoker<'_>,
    ) {
        let code = self.data.code.clone().unwrap_or_default();
        record.insert("code".to_owned(), Value::String(code.clone()));
        record.insert("multiple".to_owned(), Value::Bool(self.data.multiple));

        let self_value =
            field_self_value(ctx, invoker, &code, self.data.default_value.as_ref()).await;
        ctx.push_self(self_value);

        let mut value = match &self.data.value {
            Some(operand) => invoker
                .eval_operand(operand, ctx)
                .await
                .ok_value()
                .cloned()
                .unwrap_or(Value::Null),
            None => Value::Null,
        };
        for formatter in &self.data.formatters {
            let formatted = apply_function(invoker, ctx, formatter, value.clone()).await;
            if let Some(next) = formatted.ok_value() {
                value = next.clone();
            }
        }
        record.insert("value".to_owned(), value);

        if let Some(hidden) = &self.data.hidden {
            let hidden = invoker.eval_operand(hidden, ctx).await;
            record.insert("hidden".to_owned(), Value::Bool(hidden.is_truthy()));
        }
        if let Some(dependent) = &self.data.dependent {
            let dependent = invoker.eval_operand(dependent, ctx).await;
            record.insert(
                "dependent".to_owned(),
                dependent.ok_value().cloned().unwrap_or(Value::Null),
            );
        }

        let mut validations = Vec::with_capacity(self.data.validate.len());
        for validation in &self.data.validate {
            let outcome = invoker.invoke(validation, ctx).await;
            validations.push(outcome.ok_value().cloned().unwrap_or(Value::Null));
        }
        record.insert("validate".to_owned(), Value::Array(validations));

        ctx.pop_self();
    }
}

/// A field's `@self` binding: the current answer, else the evaluated
/// default, else null.
pub(crate) async fn field_self_value(
    ctx: &mut EvaluationContext,
    invoker: &Invoker<'_>,
    code: &str,
    default_value: Option<&Operand>,
) -> Value {
    if let Some(current) = ctx.answers.current(code) {
        return current.clone();
    }
    match default_value {
        Some(operand) => invoker
            .eval_operand(operand, ctx)
            .await
            .ok_value()
            .cloned()
            .unwrap_or(Value::Null),
        None => Value::Null,
    }
}
