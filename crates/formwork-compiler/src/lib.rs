//! Compiler for formwork journey definitions.
//!
//! Lowers an author-facing definition tree (plain JSON) into a normalized
//! AST, wires the dependency graph, and produces one [`StepArtifact`] per
//! step over a shared base compilation. The runtime crate consumes the
//! artifacts and attaches handlers.

mod artifact;
mod factory;
mod normalize;
mod pipeline;
mod traverse;
mod wiring;

#[cfg(test)]
mod normalize_tests;
#[cfg(test)]
mod pipeline_tests;

pub use artifact::{ArtifactNodes, StepArtifact};
pub use factory::Lowering;
pub use normalize::{SCOPE_ROOT, SELF_ROOT};
pub use pipeline::{
    AnalyzedJourney, CompiledJourney, JourneyCompiler, TransformedJourney, compile_journey,
};
pub use traverse::{NodeSource, WalkEntry, reachable_ids, walk};
pub use wiring::{GraphSink, wire_current_step, wire_node, wire_static};
