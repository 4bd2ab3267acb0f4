//! Transition execution.
//!
//! The submit state machine: when → guards → validate → scope push →
//! onAlways effects → branch effects → first-match next → scope pop. Load,
//! access, and action transitions run the degenerate non-validating path.
//! Effects always complete before `next` is consulted, so navigation
//! expressions observe the state effects wrote.

use async_trait::async_trait;

use formwork_core::{NodeId, Operand, TransitionBranch, TransitionKind, TransitionNode};
use serde_json::Value;
use tracing::debug;

use crate::context::EvaluationContext;
use crate::evaluation::{EvalError, Evaluation};
use crate::functions::FunctionRegistry;
use crate::handler::{Handler, HandlerCore, Invoker, impl_handler_core, operand_nodes};
use crate::handlers::block::field_self_value;
use crate::scope::frame;
use crate::transition::{TransitionOutcome, TransitionResult};

/// One field of the parent step, with its validations, captured at compile
/// time so submit-time validation does not re-walk the tree.
#[derive(Debug, Clone)]
pub(crate) struct FieldCheck {
    pub(crate) code: String,
    pub(crate) default_value: Option<Operand>,
    pub(crate) validations: Vec<NodeId>,
}

pub(crate) struct TransitionHandler {
    pub(crate) core: HandlerCore,
    pub(crate) data: TransitionNode,
    pub(crate) fields: Vec<FieldCheck>,
}

#[async_trait(?Send)]
impl Handler for TransitionHandler {
    impl_handler_core!();

    fn operand_ids(&self) -> Vec<NodeId> {
        let mut ids = operand_nodes(self.data.when.iter().chain(self.data.guards.iter()));
        for branch in [&self.data.always, &self.data.valid, &self.data.invalid] {
            ids.extend(branch.effects.iter().cloned());
            ids.extend(branch.next.iter().cloned());
        }
        ids
    }

    fn self_async(&self, _functions: &FunctionRegistry) -> bool {
        // Validation wiring to the parent step's blocks is not expressed as
        // operand edges, so a validating submit conservatively counts as
        // async.
        self.data.kind == TransitionKind::Submit && self.data.validate
    }

    async fn evaluate(&self, ctx: &mut EvaluationContext, invoker: &Invoker<'_>) -> Evaluation {
        if !self.admitted(&self.data.when, ctx, invoker).await
            || !self.admitted(&self.data.guards, ctx, invoker).await
        {
            return result_value(TransitionResult::skipped());
        }

        let validating = self.data.kind == TransitionKind::Submit && self.data.validate;
        let is_valid = if validating {
            self.run_validations(ctx, invoker).await
        } else {
            true
        };

        ctx.scope.push(frame(
            "@transitionType",
            Value::String(self.data.kind.as_str().to_owned()),
        ));
        let previous_source = ctx.transition_source;
        ctx.transition_source = Some(self.data.kind.into());

        let outcome = self.run_branches(ctx, invoker, validating, is_valid).await;

        // Scope is popped on every exit path, error or not.
        ctx.transition_source = previous_source;
        ctx.scope.pop();

        match outcome {
            Ok(outcome) => {
                debug!(transition = %self.core.id, ?outcome, "transition completed");
                result_value(TransitionResult::executed(outcome))
            }
            Err(error) => Evaluation::failure(error),
        }
    }
}

impl TransitionHandler {
    /// A missing gate admits; a failing or falsy one skips the transition.
    async fn admitted(
        &self,
        gate: &Option<Operand>,
        ctx: &mut EvaluationContext,
        invoker: &Invoker<'_>,
    ) -> bool {
        match gate {
            Some(operand) => invoker.eval_operand(operand, ctx).await.is_truthy(),
            None => true,
        }
    }

    /// Evaluate every validation reachable from the parent step's field
    /// blocks, with `@self` bound per field.
    async fn run_validations(&self, ctx: &mut EvaluationContext, invoker: &Invoker<'_>) -> bool {
        let mut is_valid = true;
        for field in &self.fields {
            let self_value =
                field_self_value(ctx, invoker, &field.code, field.default_value.as_ref()).await;
            ctx.push_self(self_value);
            for validation in &field.validations {
                let outcome = invoker.invoke(validation, ctx).await;
                let passed = outcome
                    .ok_value()
                    .and_then(|v| v.get("passed"))
                    .and_then(Value::as_bool)
                    // A validation that failed to evaluate fails the submit.
                    .unwrap_or(false);
                if !passed {
                    is_valid = false;
                }
            }
            ctx.pop_self();
        }
        is_valid
    }

    async fn run_branches(
        &self,
        ctx: &mut EvaluationContext,
        invoker: &Invoker<'_>,
        validating: bool,
        is_valid: bool,
    ) -> Result<TransitionOutcome, EvalError> {
        if validating {
            self.run_effects(&self.data.always, ctx, invoker).await?;
            let branch = if is_valid {
                &self.data.valid
            } else {
                &self.data.invalid
            };
            self.run_effects(branch, ctx, invoker).await?;
            Ok(self.first_match(branch, ctx, invoker).await)
        } else {
            self.run_effects(&self.data.always, ctx, invoker).await?;
            Ok(self.first_match(&self.data.always, ctx, invoker).await)
        }
    }

    /// Effects run sequentially in declared order; the first error aborts
    /// the transition.
    async fn run_effects(
        &self,
        branch: &TransitionBranch,
        ctx: &mut EvaluationContext,
        invoker: &Invoker<'_>,
    ) -> Result<(), EvalError> {
        for effect in &branch.effects {
            let result = invoker.invoke(effect, ctx).await;
            if let Some(error) = result.error {
                return Err(error);
            }
        }
        Ok(())
    }

    /// Evaluate `next` candidates in order; the first one that applies
    /// decides the outcome. Candidates that error are skipped.
    async fn first_match(
        &self,
        branch: &TransitionBranch,
        ctx: &mut EvaluationContext,
        invoker: &Invoker<'_>,
    ) -> TransitionOutcome {
        for candidate in &branch.next {
            let result = invoker.invoke(candidate, ctx).await;
            let Some(Value::Object(record)) = result.ok_value() else {
                continue;
            };
            match record.get("type").and_then(Value::as_str) {
                Some("redirect") => {
                    let target = record
                        .get("value")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    return TransitionOutcome::Redirect {
                        value: target.to_owned(),
                    };
                }
                Some("error") => {
                    let status = record
                        .get("status")
                        .and_then(Value::as_u64)
                        .and_then(|s| u16::try_from(s).ok())
                        .unwrap_or(500);
                    let message = record
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    return TransitionOutcome::Error {
                        status,
                        message: message.to_owned(),
                    };
                }
                _ => continue,
            }
        }
        TransitionOutcome::Continue
    }
}

fn result_value(result: TransitionResult) -> Evaluation {
    Evaluation::of(serde_json::to_value(result).expect("transition result serializes"))
}
