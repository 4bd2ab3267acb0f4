//! Registry error types.

use crate::id::NodeId;

/// Violations raised by the registries at compile time.
///
/// These are aggregate-reported through [`crate::Diagnostics`] so authors
/// see every problem at once; the enum is the per-violation payload.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    #[error("node registered with an empty id")]
    EmptyNodeId,

    #[error("duplicate function registration: {0}")]
    DuplicateFunction(String),

    #[error("invalid component entry: {0}")]
    InvalidComponent(String),
}
