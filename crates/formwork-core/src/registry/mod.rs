//! Id-keyed registries produced by compilation.

mod metadata;
mod nodes;

#[cfg(test)]
mod nodes_tests;

pub use metadata::{
    ATTACHED_TO_PARENT_NODE, IS_ANCESTOR_OF_STEP, IS_CURRENT_STEP, IS_DESCENDANT_OF_STEP,
    MetadataRegistry,
};
pub use nodes::NodeRegistry;
