//! Journey evaluation: the navigation-level view of the journey itself.

use async_trait::async_trait;

use formwork_core::{JourneyNode, NodeId};
use serde_json::{Map, Value};

use crate::context::EvaluationContext;
use crate::evaluation::Evaluation;
use crate::handler::{Handler, HandlerCore, Invoker, impl_handler_core, operand_nodes};
use crate::handlers::step::evaluate_metadata;

pub(crate) struct JourneyHandler {
    pub(crate) core: HandlerCore,
    pub(crate) data: JourneyNode,
}

#[async_trait(?Send)]
impl Handler for JourneyHandler {
    impl_handler_core!();

    fn operand_ids(&self) -> Vec<NodeId> {
        operand_nodes(
            [&self.data.title]
                .into_iter()
                .chain(self.data.description.iter())
                .chain(self.data.metadata.values()),
        )
    }

    async fn evaluate(&self, ctx: &mut EvaluationContext, invoker: &Invoker<'_>) -> Evaluation {
        let mut record = Map::new();
        record.insert("path".to_owned(), Value::String(self.data.path.clone()));
        record.insert("code".to_owned(), Value::String(self.data.code.clone()));
        if let Some(version) = &self.data.version {
            record.insert("version".to_owned(), Value::String(version.clone()));
        }

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
        record.insert(
            "metadata".to_owned(),
            evaluate_metadata(&self.data.metadata, ctx, invoker).await,
        );

        Evaluation::of(Value::Object(record))
    }
}
