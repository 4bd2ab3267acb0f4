//! Reference resolution.
//!
//! Roots, in precedence order: `@scope` (innermost frame first), `@self`,
//! then the external stores (`answers`, `data`, `post`, `query`, `params`).
//! Dangerous keys resolve to undefined without being traversed; so does any
//! miss along the path.

use async_trait::async_trait;

use formwork_core::value::{is_dangerous_key, lookup_path};
use formwork_core::{NodeId, ReferenceNode};
use serde_json::Value;

use crate::context::EvaluationContext;
use crate::evaluation::Evaluation;
use crate::handler::{Handler, HandlerCore, Invoker, impl_handler_core, operand_nodes};

pub(crate) struct ReferenceHandler {
    pub(crate) core: HandlerCore,
    pub(crate) data: ReferenceNode,
}

#[async_trait(?Send)]
impl Handler for ReferenceHandler {
    impl_handler_core!();

    fn operand_ids(&self) -> Vec<NodeId> {
        operand_nodes(self.data.base.iter())
    }

    async fn evaluate(&self, ctx: &mut EvaluationContext, invoker: &Invoker<'_>) -> Evaluation {
        if let Some(base) = &self.data.base {
            let base = invoker.eval_operand(base, ctx).await;
            let Some(root) = base.ok_value() else {
                return Evaluation::undefined();
            };
            return Evaluation::opt(lookup_path(root, &self.data.path).cloned());
        }

        let Some(root) = self.data.path.first() else {
            return Evaluation::undefined();
        };
        let rest = &self.data.path[1..];
        match root.as_str() {
            "@scope" => {
                let Some(key) = rest.first() else {
                    return Evaluation::undefined();
                };
                if is_dangerous_key(key) {
                    return Evaluation::undefined();
                }
                let Some(bound) = ctx.scope.lookup(key) else {
                    return Evaluation::undefined();
                };
                Evaluation::opt(lookup_path(bound, &rest[1..]).cloned())
            }
            "@self" => match ctx.current_self() {
                Some(value) => Evaluation::opt(lookup_path(value, rest).cloned()),
                None => Evaluation::undefined(),
            },
            "answers" => keyed(rest, |key| ctx.answers.current(key).cloned()),
            "data" => keyed(rest, |key| ctx.data.get(key).cloned()),
            "post" => keyed(rest, |key| ctx.request.post.get(key).cloned()),
            "query" => keyed(rest, |key| {
                ctx.request.query.get(key).map(|v| Value::String(v.clone()))
            }),
            "params" => keyed(rest, |key| {
                ctx.request.params.get(key).map(|v| Value::String(v.clone()))
            }),
            _ => Evaluation::undefined(),
        }
    }
}

/// Resolve `store[key]` then navigate the remaining segments.
fn keyed(rest: &[String], read: impl FnOnce(&str) -> Option<Value>) -> Evaluation {
    let Some(key) = rest.first() else {
        return Evaluation::undefined();
    };
    if is_dangerous_key(key) {
        return Evaluation::undefined();
    }
    let Some(value) = read(key) else {
        return Evaluation::undefined();
    };
    Evaluation::opt(lookup_path(&value, &rest[1..]).cloned())
}
