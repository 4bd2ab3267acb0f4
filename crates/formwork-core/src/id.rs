//! Node identity.
//!
//! Every compile-time and runtime entity carries a [`NodeId`] minted by an
//! [`IdGenerator`]. Ids are category-tagged and monotonically unique within a
//! run; comparing two ids is equivalent to comparing their rendered
//! `"<category>:<N>"` forms.

use serde::{Deserialize, Serialize};

/// Category tag for a minted id.
///
/// Categories keep separate counters so compile-time AST nodes, runtime
/// synthesized nodes, and compile-time pseudo-nodes can never collide even
/// when minted by different generators sharing a compilation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdCategory {
    CompileAst,
    RuntimeAst,
    CompilePseudo,
}

impl IdCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            IdCategory::CompileAst => "compile_ast",
            IdCategory::RuntimeAst => "runtime_ast",
            IdCategory::CompilePseudo => "compile_pseudo",
        }
    }
}

impl std::fmt::Display for IdCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unique, category-tagged node identifier.
///
/// Structural equality here coincides with string equality of the rendered
/// form, so ids are safe to use as opaque map keys.
#[derive(Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId {
    category: IdCategory,
    seq: u32,
}

impl NodeId {
    pub fn category(&self) -> IdCategory {
        self.category
    }

    /// Raw sequence number within the category. Diagnostic use only.
    pub fn seq(&self) -> u32 {
        self.seq
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.category, self.seq)
    }
}

/// Mints [`NodeId`]s, one monotonically increasing counter per category.
///
/// Ids are never reused within a run.
#[derive(Debug, Default, Clone)]
pub struct IdGenerator {
    compile_ast: u32,
    runtime_ast: u32,
    compile_pseudo: u32,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, category: IdCategory) -> NodeId {
        let counter = match category {
            IdCategory::CompileAst => &mut self.compile_ast,
            IdCategory::RuntimeAst => &mut self.runtime_ast,
            IdCategory::CompilePseudo => &mut self.compile_pseudo,
        };
        *counter += 1;
        NodeId {
            category,
            seq: *counter,
        }
    }
}
