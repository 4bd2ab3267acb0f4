//! Evaluator runtime for compiled formwork step artifacts.
//!
//! Consumes the [`formwork_compiler::StepArtifact`]s the compiler produces,
//! attaches one thunk handler per node (compilation phase 9), and evaluates
//! nodes on demand with per-request caching, scope, and cascading cache
//! invalidation on mutating effects.

mod answers;
mod components;
mod context;
mod effects;
mod engine;
mod evaluation;
mod functions;
mod handler;
mod handlers;
mod request;
mod scope;
mod transition;

#[cfg(test)]
mod registry_tests;
#[cfg(test)]
mod scope_tests;
#[cfg(test)]
mod test_support;

pub use answers::{AnswerHistory, AnswerStore, Mutation, MutationSource};
pub use components::{ComponentEntry, ComponentRegistry, RendererFn};
pub use context::EvaluationContext;
pub use effects::EffectScope;
pub use engine::{EvalLimits, StepEngine};
pub use evaluation::{EvalError, EvalErrorKind, Evaluation, LocalBoxFuture};
pub use functions::{Callable, FunctionError, FunctionRegistry};
pub use handler::{Handler, Invoker};
pub use handlers::ValidationOutcome;
pub use request::{CookieOptions, RequestInfo, ResponseState};
pub use scope::{ScopeStack, element_frame, frame};
pub use transition::{TransitionOutcome, TransitionResult};
