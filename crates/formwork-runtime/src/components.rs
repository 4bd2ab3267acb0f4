//! Component registry: the rendering boundary.
//!
//! The engine guarantees blocks are fully evaluated before a renderer is
//! invoked and never inspects the returned markup.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use formwork_core::RegistryError;

use crate::evaluation::LocalBoxFuture;
use crate::functions::FunctionError;

/// Renders one evaluated block record to markup.
pub type RendererFn = Arc<
    dyn for<'a> Fn(&'a Value) -> LocalBoxFuture<'a, Result<String, FunctionError>> + Send + Sync,
>;

pub struct ComponentEntry {
    pub variant: String,
    pub render: RendererFn,
}

#[derive(Clone, Default)]
pub struct ComponentRegistry {
    renderers: IndexMap<String, RendererFn>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entry: ComponentEntry) -> Result<(), RegistryError> {
        if entry.variant.is_empty() {
            return Err(RegistryError::InvalidComponent(
                "component entry is missing a variant".to_owned(),
            ));
        }
        if self.renderers.contains_key(&entry.variant) {
            return Err(RegistryError::InvalidComponent(format!(
                "duplicate component variant `{}`",
                entry.variant
            )));
        }
        self.renderers.insert(entry.variant, entry.render);
        Ok(())
    }

    /// Register a batch, collecting every violation.
    pub fn register_many(
        &mut self,
        entries: impl IntoIterator<Item = ComponentEntry>,
    ) -> Result<(), Vec<RegistryError>> {
        let mut errors = Vec::new();
        for entry in entries {
            if let Err(err) = self.register(entry) {
                errors.push(err);
            }
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    pub fn get(&self, variant: &str) -> Option<&RendererFn> {
        self.renderers.get(variant)
    }

    pub fn has(&self, variant: &str) -> bool {
        self.renderers.contains_key(variant)
    }

    pub fn variants(&self) -> impl Iterator<Item = &String> {
        self.renderers.keys()
    }
}
