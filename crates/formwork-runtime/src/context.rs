//! The per-request evaluation context.
//!
//! All mutable evaluation state lives here: the cache, the scope stack, the
//! answer store, and request/response state. The engine and its handlers
//! are immutable and shared; the context is exclusively owned by one request.

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use formwork_core::NodeId;

use crate::answers::{AnswerStore, MutationSource};
use crate::evaluation::Evaluation;
use crate::request::{RequestInfo, ResponseState};
use crate::scope::ScopeStack;

#[derive(Debug, Default)]
pub struct EvaluationContext {
    pub answers: AnswerStore,
    pub data: IndexMap<String, Value>,
    pub request: RequestInfo,
    pub response: ResponseState,
    pub scope: ScopeStack,
    /// `@self` bindings, stacked per field being evaluated.
    pub(crate) self_values: Vec<Value>,
    /// Per-request result cache keyed by `(node, scope digest)`.
    cache: IndexMap<(NodeId, u64), Evaluation>,
    /// The transition currently executing, if any; stamps answer writes.
    pub(crate) transition_source: Option<MutationSource>,
    /// Nodes currently being evaluated, for re-entrancy detection.
    pub(crate) active: IndexSet<NodeId>,
    pub(crate) fuel_used: u32,
    pub(crate) depth: u32,
}

impl EvaluationContext {
    pub fn new(request: RequestInfo) -> Self {
        Self {
            request,
            ..Self::default()
        }
    }

    /// Seed an answer as a raw form-post value.
    pub fn seed_answer(&mut self, key: impl Into<String>, value: Value) {
        self.answers.seed_post(key, value);
    }

    pub fn seed_data(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    pub fn current_self(&self) -> Option<&Value> {
        self.self_values.last()
    }

    pub(crate) fn push_self(&mut self, value: Value) {
        self.self_values.push(value);
    }

    pub(crate) fn pop_self(&mut self) {
        self.self_values.pop();
    }

    pub(crate) fn cache_get(&self, node: &NodeId, digest: u64) -> Option<&Evaluation> {
        self.cache.get(&(node.clone(), digest))
    }

    pub(crate) fn cache_put(&mut self, node: &NodeId, digest: u64, result: Evaluation) {
        self.cache.insert((node.clone(), digest), result);
    }

    /// Drop every cached result for `node`, across all scope digests.
    pub(crate) fn invalidate_node(&mut self, node: &NodeId) {
        self.cache.retain(|(cached, _), _| cached != node);
    }
}
