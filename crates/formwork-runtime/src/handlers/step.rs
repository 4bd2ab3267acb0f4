//! Step evaluation.
//!
//! Emits the evaluated view of the step's public properties. The property
//! set depends on step-scope metadata: the current step (and its ancestors)
//! additionally expose `backlink`; transition arrays are never evaluated
//! here, the orchestrator owns them.

use async_trait::async_trait;

use formwork_core::{IS_ANCESTOR_OF_STEP, IS_CURRENT_STEP, NodeId, Operand, StepNode};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::context::EvaluationContext;
use crate::evaluation::Evaluation;
use crate::handler::{Handler, HandlerCore, Invoker, impl_handler_core, operand_nodes};

pub(crate) struct StepHandler {
    pub(crate) core: HandlerCore,
    pub(crate) data: StepNode,
}

#[async_trait(?Send)]
impl Handler for StepHandler {
    impl_handler_core!();

    fn operand_ids(&self) -> Vec<NodeId> {
        let mut ids = operand_nodes(
            [&self.data.title]
                .into_iter()
                .chain(self.data.description.iter())
                .chain(self.data.backlink.iter())
                .chain(self.data.metadata.values()),
        );
        ids.extend(self.data.blocks.iter().cloned());
        ids
    }

    async fn evaluate(&self, ctx: &mut EvaluationContext, invoker: &Invoker<'_>) -> Evaluation {
        let metadata = &invoker.engine.artifact().metadata;
        let in_scope = metadata.flag(&self.core.id, IS_CURRENT_STEP)
            || metadata.flag(&self.core.id, IS_ANCESTOR_OF_STEP);

        let mut record = Map::new();
        record.insert("path".to_owned(), Value::String(self.data.path.clone()));
        record.insert(
            "isEntryPoint".to_owned(),
            Value::Bool(self.data.is_entry_point),
        );

        let title = invoker.eval_operand(&self.data.title, ctx).await;
        record.insert(
            "title".to_owned(),
            title.ok_value().cloned().unwrap_or(Value::Null),
        );
        if let Some(description) = &self.data.description {
            let description = invoker.eval_operand(description, ctx).await;
            record.insert(
                "description".to_owned(),
                description.ok_value().cloned().unwrap_or(Value::Null),
            );
        }
        if in_scope && let Some(backlink) = &self.data.backlink {
            let backlink = invoker.eval_operand(backlink, ctx).await;
            record.insert(
                "backlink".to_owned(),
                backlink.ok_value().cloned().unwrap_or(Value::Null),
            );
        }

        let mut blocks = Vec::with_capacity(self.data.blocks.len());
        for block in &self.data.blocks {
            let evaluated = invoker.invoke(block, ctx).await;
            blocks.push(evaluated.ok_value().cloned().unwrap_or(Value::Null));
        }
        record.insert("blocks".to_owned(), Value::Array(blocks));

        record.insert(
            "metadata".to_owned(),
            evaluate_metadata(&self.data.metadata, ctx, invoker).await,
        );

        Evaluation::of(Value::Object(record))
    }
}

pub(crate) async fn evaluate_metadata(
    metadata: &IndexMap<String, Operand>,
    ctx: &mut EvaluationContext,
    invoker: &Invoker<'_>,
) -> Value {
    let mut out = Map::new();
    for (key, operand) in metadata {
        let value = invoker.eval_operand(operand, ctx).await;
        out.insert(key.clone(), value.ok_value().cloned().unwrap_or(Value::Null));
    }
    Value::Object(out)
}
