//! Evaluation results and errors.
//!
//! Handlers never throw: an evaluation either carries a value, carries
//! nothing (undefined), or carries a typed error in the result channel.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use formwork_core::NodeId;

/// Single-threaded boxed future, the suspension currency of the async path.
pub type LocalBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EvalErrorKind {
    EvaluationFailed,
    HandlerNotFound,
    Cycle,
    TypeError,
}

impl std::fmt::Display for EvalErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalErrorKind::EvaluationFailed => write!(f, "EVALUATION_FAILED"),
            EvalErrorKind::HandlerNotFound => write!(f, "HANDLER_NOT_FOUND"),
            EvalErrorKind::Cycle => write!(f, "CYCLE"),
            EvalErrorKind::TypeError => write!(f, "TYPE_ERROR"),
        }
    }
}

#[derive(Clone, PartialEq, Debug, thiserror::Error)]
#[error("{kind} at {node}: {message}")]
pub struct EvalError {
    pub kind: EvalErrorKind,
    pub node: NodeId,
    pub message: String,
}

impl EvalError {
    pub fn new(kind: EvalErrorKind, node: &NodeId, message: impl Into<String>) -> Self {
        Self {
            kind,
            node: node.clone(),
            message: message.into(),
        }
    }

    pub fn failed(node: &NodeId, message: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::EvaluationFailed, node, message)
    }

    pub fn type_error(node: &NodeId, message: impl Into<String>) -> Self {
        Self::new(EvalErrorKind::TypeError, node, message)
    }
}

/// Result of evaluating one node: a value, undefined, or an error.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Evaluation {
    pub value: Option<Value>,
    pub error: Option<EvalError>,
}

impl Evaluation {
    pub fn of(value: Value) -> Self {
        Self {
            value: Some(value),
            error: None,
        }
    }

    pub fn opt(value: Option<Value>) -> Self {
        Self {
            value,
            error: None,
        }
    }

    /// Undefined: no value, no error.
    pub fn undefined() -> Self {
        Self::default()
    }

    pub fn failure(error: EvalError) -> Self {
        Self {
            value: None,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Truthiness of the carried value; errors and undefined are falsy.
    pub fn is_truthy(&self) -> bool {
        self.error.is_none() && formwork_core::value::is_truthy_opt(self.value.as_ref())
    }

    /// The value, with errors and undefined flattened to `None`.
    pub fn ok_value(&self) -> Option<&Value> {
        if self.error.is_some() {
            None
        } else {
            self.value.as_ref()
        }
    }
}
