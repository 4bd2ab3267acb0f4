//! Transition results.

use serde::{Deserialize, Serialize};

/// Terminal action of a transition.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransitionOutcome {
    /// No navigation: fall through to the next transition or render.
    Continue,
    Redirect { value: String },
    Error { status: u16, message: String },
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TransitionResult {
    /// Whether the transition's `when`/`guards` admitted it.
    pub executed: bool,
    pub outcome: TransitionOutcome,
}

impl TransitionResult {
    pub fn skipped() -> Self {
        Self {
            executed: false,
            outcome: TransitionOutcome::Continue,
        }
    }

    pub fn executed(outcome: TransitionOutcome) -> Self {
        Self {
            executed: true,
            outcome,
        }
    }

    pub fn is_continue(&self) -> bool {
        self.outcome == TransitionOutcome::Continue
    }
}
