//! The handler contract and the invoker adapter.

use async_trait::async_trait;

use formwork_core::{NodeId, Operand};

use crate::context::EvaluationContext;
use crate::engine::StepEngine;
use crate::evaluation::{Evaluation, LocalBoxFuture};
use crate::functions::FunctionRegistry;

/// One evaluator per AST node.
///
/// Handlers are immutable after compilation (phase 9 sets `is_async` once)
/// and hold no references to other handlers; recursion goes through the
/// [`Invoker`] so caching, scope, and limits apply uniformly.
#[async_trait(?Send)]
pub trait Handler {
    fn node_id(&self) -> &NodeId;

    /// Whether evaluation may suspend. The sync dispatch path is legal iff
    /// this is `false`, which requires every transitive operand to be sync.
    fn is_async(&self) -> bool;

    /// Set by the engine during phase 9, in topological order.
    fn mark_async(&mut self, is_async: bool);

    /// Operand nodes whose async-ness this handler unions. Unknown operands
    /// count as async.
    fn operand_ids(&self) -> Vec<NodeId>;

    /// Async-ness of the handler itself, independent of operands.
    fn self_async(&self, _functions: &FunctionRegistry) -> bool {
        false
    }

    async fn evaluate(&self, ctx: &mut EvaluationContext, invoker: &Invoker<'_>) -> Evaluation;
}

/// Shared identity and async flag embedded in every handler struct.
#[derive(Debug, Clone)]
pub(crate) struct HandlerCore {
    pub(crate) id: NodeId,
    pub(crate) is_async: bool,
}

impl HandlerCore {
    pub(crate) fn new(id: NodeId) -> Self {
        // Conservative default until phase 9 computes the real flag.
        Self { id, is_async: true }
    }
}

/// Implements the identity/flag boilerplate of [`Handler`] for a struct
/// with a `core: HandlerCore` field.
macro_rules! impl_handler_core {
    () => {
        fn node_id(&self) -> &formwork_core::NodeId {
            &self.core.id
        }

        fn is_async(&self) -> bool {
            self.core.is_async
        }

        fn mark_async(&mut self, is_async: bool) {
            self.core.is_async = is_async;
        }
    };
}
pub(crate) use impl_handler_core;

/// Collect the node ids out of a set of operand positions.
pub(crate) fn operand_nodes<'a>(operands: impl IntoIterator<Item = &'a Operand>) -> Vec<NodeId> {
    operands
        .into_iter()
        .filter_map(|operand| operand.as_node().cloned())
        .collect()
}

/// The adapter handlers use to evaluate their operands recursively, with
/// cache, scope, and limits applied by the engine.
pub struct Invoker<'e> {
    pub(crate) engine: &'e StepEngine,
}

impl<'e> Invoker<'e> {
    pub(crate) fn new(engine: &'e StepEngine) -> Self {
        Self { engine }
    }

    pub fn invoke<'a>(
        &'a self,
        id: &'a NodeId,
        ctx: &'a mut EvaluationContext,
    ) -> LocalBoxFuture<'a, Evaluation> {
        Box::pin(self.engine.invoke(id, ctx))
    }

    pub fn invoke_sync(&self, id: &NodeId, ctx: &mut EvaluationContext) -> Evaluation {
        self.engine.invoke_sync(id, ctx)
    }

    pub(crate) fn functions(&self) -> &FunctionRegistry {
        self.engine.functions()
    }

    /// Evaluate an operand position: literals pass through, nodes recurse.
    pub async fn eval_operand(
        &self,
        operand: &Operand,
        ctx: &mut EvaluationContext,
    ) -> Evaluation {
        match operand {
            Operand::Literal(value) => Evaluation::of(value.clone()),
            Operand::Node(id) => self.invoke(id, ctx).await,
        }
    }
}
