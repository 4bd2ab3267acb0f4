//! The evaluator runtime.
//!
//! A [`StepEngine`] binds one compiled step artifact to a function registry
//! and a handler table (compilation phase 9). Engines are immutable after
//! construction and safe to share across requests; all mutable state lives
//! in the per-request [`EvaluationContext`].

use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, trace};

use formwork_compiler::StepArtifact;
use formwork_core::{NodeId, Payload, PseudoKind, TransitionKind};

use crate::context::EvaluationContext;
use crate::evaluation::{EvalError, EvalErrorKind, Evaluation};
use crate::functions::FunctionRegistry;
use crate::handler::{Handler, Invoker};
use crate::handlers::build_handler;
use crate::transition::{TransitionOutcome, TransitionResult};

/// Runtime limits for one request.
#[derive(Clone, Copy, Debug)]
pub struct EvalLimits {
    /// Maximum handler invocations (default: 1,000,000).
    pub(crate) invocation_fuel: u32,
    /// Maximum invocation depth (default: 256).
    pub(crate) recursion_limit: u32,
}

impl Default for EvalLimits {
    fn default() -> Self {
        Self {
            invocation_fuel: 1_000_000,
            recursion_limit: 256,
        }
    }
}

impl EvalLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invocation_fuel(mut self, fuel: u32) -> Self {
        self.invocation_fuel = fuel;
        self
    }

    pub fn recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }
}

/// A compiled step bound to its handlers: the executable artifact.
pub struct StepEngine {
    artifact: StepArtifact,
    functions: Arc<FunctionRegistry>,
    handlers: IndexMap<NodeId, Box<dyn Handler>>,
    limits: EvalLimits,
}

impl StepEngine {
    /// Phase 9: instantiate a handler per node and compute async-ness in
    /// topological order, so each handler sees settled operand flags.
    pub fn compile(artifact: StepArtifact, functions: Arc<FunctionRegistry>) -> Self {
        let mut handlers: IndexMap<NodeId, Box<dyn Handler>> = IndexMap::new();
        for id in artifact.nodes.ids() {
            if let Some(node) = artifact.nodes.get(id) {
                handlers.insert(id.clone(), build_handler(node, &artifact));
            }
        }

        // Operand handlers settle before their dependents; anything not in
        // the cached order (isolated nodes) follows in registration order.
        let mut order: Vec<NodeId> = artifact.topo.clone();
        for id in handlers.keys() {
            if !artifact.topo.contains(id) {
                order.push(id.clone());
            }
        }

        let mut flags: IndexMap<NodeId, bool> = IndexMap::new();
        for id in &order {
            let Some(handler) = handlers.get(id) else {
                continue;
            };
            let is_async = handler.self_async(&functions)
                || handler
                    .operand_ids()
                    .iter()
                    .any(|operand| *flags.get(operand).unwrap_or(&true));
            flags.insert(id.clone(), is_async);
        }
        for (id, is_async) in flags {
            if let Some(handler) = handlers.get_mut(&id) {
                handler.mark_async(is_async);
            }
        }

        debug!(
            step = %artifact.step_path,
            handlers = handlers.len(),
            "compiled step engine"
        );
        Self {
            artifact,
            functions,
            handlers,
            limits: EvalLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: EvalLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn artifact(&self) -> &StepArtifact {
        &self.artifact
    }

    pub(crate) fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn handler_is_async(&self, id: &NodeId) -> Option<bool> {
        self.handlers.get(id).map(|handler| handler.is_async())
    }

    /// Evaluate one node with cache, limits, and re-entrancy detection.
    pub async fn invoke(&self, id: &NodeId, ctx: &mut EvaluationContext) -> Evaluation {
        let Some(handler) = self.handlers.get(id) else {
            return Evaluation::failure(EvalError::new(
                EvalErrorKind::HandlerNotFound,
                id,
                "no handler compiled for node",
            ));
        };

        let digest = self.scope_digest(ctx);
        if let Some(cached) = ctx.cache_get(id, digest) {
            return cached.clone();
        }

        if !ctx.active.insert(id.clone()) {
            return Evaluation::failure(EvalError::new(
                EvalErrorKind::Cycle,
                id,
                "node is already being evaluated",
            ));
        }
        ctx.fuel_used += 1;
        ctx.depth += 1;
        let result = if ctx.fuel_used > self.limits.invocation_fuel {
            Evaluation::failure(EvalError::failed(id, "invocation fuel exhausted"))
        } else if ctx.depth > self.limits.recursion_limit {
            Evaluation::failure(EvalError::failed(id, "recursion limit exceeded"))
        } else {
            handler.evaluate(ctx, &Invoker::new(self)).await
        };
        ctx.depth -= 1;
        ctx.active.swap_remove(id);

        // Errors are cached too, so one failing node cannot storm within a
        // request.
        ctx.cache_put(id, digest, result.clone());
        result
    }

    /// Synchronous dispatch. Legal iff the root handler (and therefore its
    /// whole transitive operand set) is sync; an async root is refused
    /// instead of risking a blocked suspension.
    pub fn invoke_sync(&self, id: &NodeId, ctx: &mut EvaluationContext) -> Evaluation {
        match self.handler_is_async(id) {
            None => Evaluation::failure(EvalError::new(
                EvalErrorKind::HandlerNotFound,
                id,
                "no handler compiled for node",
            )),
            Some(true) => Evaluation::failure(EvalError::failed(
                id,
                "async handler invoked on the sync path",
            )),
            Some(false) => pollster::block_on(self.invoke(id, ctx)),
        }
    }

    /// Evaluate a node under an extra scope frame, popped on every exit.
    pub async fn invoke_with_scope(
        &self,
        id: &NodeId,
        scope: IndexMap<String, Value>,
        ctx: &mut EvaluationContext,
    ) -> Evaluation {
        ctx.scope.push(scope);
        let result = self.invoke(id, ctx).await;
        ctx.scope.pop();
        result
    }

    /// Evaluate the current step's view.
    pub async fn evaluate_step(&self, ctx: &mut EvaluationContext) -> Evaluation {
        let step = self.artifact.current_step.clone();
        self.invoke(&step, ctx).await
    }

    pub fn evaluate_step_sync(&self, ctx: &mut EvaluationContext) -> Evaluation {
        let step = self.artifact.current_step.clone();
        self.invoke_sync(&step, ctx)
    }

    // -- transition orchestration -----------------------------------------

    pub async fn run_load(&self, ctx: &mut EvaluationContext) -> TransitionResult {
        self.run_transitions(TransitionKind::Load, ctx).await
    }

    pub async fn run_access(&self, ctx: &mut EvaluationContext) -> TransitionResult {
        self.run_transitions(TransitionKind::Access, ctx).await
    }

    pub async fn run_action(&self, ctx: &mut EvaluationContext) -> TransitionResult {
        self.run_transitions(TransitionKind::Action, ctx).await
    }

    pub async fn run_submit(&self, ctx: &mut EvaluationContext) -> TransitionResult {
        self.run_transitions(TransitionKind::Submit, ctx).await
    }

    /// Run the journey's then the current step's transitions of one kind,
    /// in declared order, stopping at the first non-continue outcome.
    pub async fn run_transitions(
        &self,
        kind: TransitionKind,
        ctx: &mut EvaluationContext,
    ) -> TransitionResult {
        let mut last = TransitionResult::skipped();
        for id in self.transitions_for(kind) {
            let evaluated = self.invoke(&id, ctx).await;
            if let Some(error) = evaluated.error {
                // A failed effect aborts the whole lifecycle moment.
                return TransitionResult::executed(TransitionOutcome::Error {
                    status: 500,
                    message: error.to_string(),
                });
            }
            let Some(value) = evaluated.value else {
                continue;
            };
            let Ok(result) = serde_json::from_value::<TransitionResult>(value) else {
                continue;
            };
            if result.executed && !result.is_continue() {
                return result;
            }
            if result.executed {
                last = result;
            }
        }
        last
    }

    /// Transition nodes for one lifecycle moment: journey-level first, then
    /// the current step's.
    fn transitions_for(&self, kind: TransitionKind) -> Vec<NodeId> {
        let mut out = Vec::new();
        if let Some(Payload::Journey(journey)) = self
            .artifact
            .nodes
            .get(&self.artifact.journey)
            .map(|n| &n.payload)
        {
            match kind {
                TransitionKind::Load => out.extend(journey.on_load.iter().cloned()),
                TransitionKind::Access => out.extend(journey.on_access.iter().cloned()),
                TransitionKind::Action | TransitionKind::Submit => {}
            }
        }
        if let Some(Payload::Step(step)) = self
            .artifact
            .nodes
            .get(&self.artifact.current_step)
            .map(|n| &n.payload)
        {
            let list = match kind {
                TransitionKind::Load => &step.on_load,
                TransitionKind::Access => &step.on_access,
                TransitionKind::Action => &step.on_action,
                TransitionKind::Submit => &step.on_submission,
            };
            out.extend(list.iter().cloned());
        }
        out
    }

    // -- cache invalidation -----------------------------------------------

    /// Invalidate everything downstream of an answer write.
    pub(crate) fn invalidate_answer(&self, ctx: &mut EvaluationContext, code: &str) {
        self.invalidate_key(ctx, &[PseudoKind::AnswerLocal, PseudoKind::AnswerRemote], code);
    }

    /// Invalidate everything downstream of a data write.
    pub(crate) fn invalidate_data(&self, ctx: &mut EvaluationContext, key: &str) {
        self.invalidate_key(ctx, &[PseudoKind::Data], key);
    }

    fn invalidate_key(&self, ctx: &mut EvaluationContext, kinds: &[PseudoKind], key: &str) {
        for kind in kinds {
            let Some(pseudo) = self.artifact.find_pseudo(*kind, key) else {
                continue;
            };
            self.invalidate_cascade(ctx, pseudo);
        }
    }

    /// Remove the cache entries of `start` and of every node reachable from
    /// it through dependent edges.
    fn invalidate_cascade(&self, ctx: &mut EvaluationContext, start: &NodeId) {
        let mut queue = vec![start.clone()];
        let mut seen = indexmap::IndexSet::new();
        while let Some(id) = queue.pop() {
            if !seen.insert(id.clone()) {
                continue;
            }
            ctx.invalidate_node(&id);
            for dependent in self.artifact.graph.get_dependents(&id) {
                queue.push(dependent.clone());
            }
        }
        trace!(start = %start, invalidated = seen.len(), "cache invalidation cascade");
    }

    /// Cache key: the scope stack plus the `@self` binding stack.
    fn scope_digest(&self, ctx: &EvaluationContext) -> u64 {
        let mut hasher = DefaultHasher::new();
        ctx.scope.digest().hash(&mut hasher);
        for value in &ctx.self_values {
            value.to_string().hash(&mut hasher);
        }
        hasher.finish()
    }
}
