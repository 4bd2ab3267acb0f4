//! Core data structures for the formwork form engine.
//!
//! Three layers:
//! - **Identity**: category-tagged unique ids ([`NodeId`], [`IdGenerator`])
//! - **AST**: typed node payloads with operand positions ([`Node`], [`Payload`])
//! - **Registries**: id-keyed ownership and metadata tables
//!
//! The compiler lowers author definitions into these structures; the runtime
//! reads them by id and never by pointer.

mod diagnostics;
mod error;
mod id;
mod node;
mod registry;
pub mod value;

#[cfg(test)]
mod id_tests;
#[cfg(test)]
mod node_tests;
#[cfg(test)]
mod value_tests;

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use error::RegistryError;
pub use id::{IdCategory, IdGenerator, NodeId};
pub use node::{
    BlockKind, BlockNode, ChildRef, CollectionNode, ConditionalNode, ExpressionKind, FormatNode,
    FunctionNode, FunctionRole, IterateNode, IteratorKind, JourneyNode, NextNode, Node, NodeType,
    Operand, OutcomeKind, OutcomeNode, Payload, PipelineNode, PredicateKind, PredicatePayload,
    PseudoKind, PseudoNode, ReferenceNode, StepNode, TransitionBranch, TransitionKind,
    TransitionNode, ValidationNode,
};
pub use registry::{
    ATTACHED_TO_PARENT_NODE, IS_ANCESTOR_OF_STEP, IS_CURRENT_STEP, IS_DESCENDANT_OF_STEP,
    MetadataRegistry, NodeRegistry,
};
