//! The user-supplied function registry.
//!
//! Three roles with distinct contracts:
//! - **transformer**: `(value, ...args) -> value`, pure
//! - **condition**: `(value, ...args) -> bool`, pure
//! - **effect**: `(effect context, ...args) -> value`, may mutate answers
//!   and data through the context API; registrable as sync or async
//!
//! Duplicate registration is an error, aggregate-reported by
//! [`FunctionRegistry::register_many`].

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use formwork_core::RegistryError;

use crate::effects::EffectScope;
use crate::evaluation::LocalBoxFuture;

/// Error raised inside a user function; surfaced as `EVALUATION_FAILED`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct FunctionError(pub String);

impl FunctionError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

pub type TransformerFn = Arc<dyn Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync>;
pub type ConditionFn = Arc<dyn Fn(&[Value]) -> Result<bool, FunctionError> + Send + Sync>;
pub type EffectFn = Arc<
    dyn for<'a, 'e> Fn(&'a mut EffectScope<'e>, &'a [Value]) -> Result<Value, FunctionError>
        + Send
        + Sync,
>;
pub type AsyncEffectFn = Arc<
    dyn for<'a, 'e> Fn(
            &'a mut EffectScope<'e>,
            Vec<Value>,
        ) -> LocalBoxFuture<'a, Result<Value, FunctionError>>
        + Send
        + Sync,
>;

#[derive(Clone)]
pub enum Callable {
    Transformer(TransformerFn),
    Condition(ConditionFn),
    Effect(EffectFn),
    AsyncEffect(AsyncEffectFn),
}

impl Callable {
    pub fn is_async(&self) -> bool {
        matches!(self, Callable::AsyncEffect(_))
    }
}

#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: IndexMap<String, Callable>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        callable: Callable,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.functions.contains_key(&name) {
            return Err(RegistryError::DuplicateFunction(name));
        }
        self.functions.insert(name, callable);
        Ok(())
    }

    /// Register a batch, collecting every duplicate instead of stopping at
    /// the first.
    pub fn register_many(
        &mut self,
        entries: impl IntoIterator<Item = (String, Callable)>,
    ) -> Result<(), Vec<RegistryError>> {
        let mut errors = Vec::new();
        for (name, callable) in entries {
            if let Err(err) = self.register(name, callable) {
                errors.push(err);
            }
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    pub fn register_transformer(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&[Value]) -> Result<Value, FunctionError> + Send + Sync + 'static,
    ) -> Result<(), RegistryError> {
        self.register(name, Callable::Transformer(Arc::new(f)))
    }

    pub fn register_condition(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&[Value]) -> Result<bool, FunctionError> + Send + Sync + 'static,
    ) -> Result<(), RegistryError> {
        self.register(name, Callable::Condition(Arc::new(f)))
    }

    pub fn register_effect(
        &mut self,
        name: impl Into<String>,
        f: impl for<'a, 'e> Fn(&'a mut EffectScope<'e>, &'a [Value]) -> Result<Value, FunctionError>
            + Send
            + Sync
            + 'static,
    ) -> Result<(), RegistryError> {
        self.register(name, Callable::Effect(Arc::new(f)))
    }

    pub fn register_async_effect(
        &mut self,
        name: impl Into<String>,
        f: impl for<'a, 'e> Fn(
                &'a mut EffectScope<'e>,
                Vec<Value>,
            ) -> LocalBoxFuture<'a, Result<Value, FunctionError>>
            + Send
            + Sync
            + 'static,
    ) -> Result<(), RegistryError> {
        self.register(name, Callable::AsyncEffect(Arc::new(f)))
    }

    pub fn has(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Callable> {
        self.functions.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.functions.keys()
    }

    /// Async-ness of a registered callable; unknown names return `None` and
    /// callers must assume async.
    pub fn is_async(&self, name: &str) -> Option<bool> {
        self.functions.get(name).map(Callable::is_async)
    }

    /// A registry pre-loaded with the small builtin set used by tests and
    /// the CLI.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtins(&mut registry);
        registry
    }
}

fn string_arg(args: &[Value], index: usize) -> String {
    formwork_core::value::to_display_string(args.get(index))
}

/// Small general-purpose function set: string transformers and the
/// conditions validations lean on.
fn builtins(registry: &mut FunctionRegistry) {
    registry
        .register_transformer("trim", |args| {
            Ok(Value::String(string_arg(args, 0).trim().to_owned()))
        })
        .expect("fresh registry");
    registry
        .register_transformer("upper", |args| {
            Ok(Value::String(string_arg(args, 0).to_uppercase()))
        })
        .expect("fresh registry");
    registry
        .register_transformer("lower", |args| {
            Ok(Value::String(string_arg(args, 0).to_lowercase()))
        })
        .expect("fresh registry");
    registry
        .register_transformer("default", |args| {
            let value = args.first().cloned().unwrap_or(Value::Null);
            if formwork_core::value::is_truthy(&value) {
                Ok(value)
            } else {
                Ok(args.get(1).cloned().unwrap_or(Value::Null))
            }
        })
        .expect("fresh registry");
    registry
        .register_condition("truthy", |args| {
            Ok(formwork_core::value::is_truthy_opt(args.first()))
        })
        .expect("fresh registry");
    registry
        .register_condition("isEmpty", |args| {
            Ok(match args.first() {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.is_empty(),
                Some(Value::Array(items)) => items.is_empty(),
                Some(Value::Object(map)) => map.is_empty(),
                Some(_) => false,
            })
        })
        .expect("fresh registry");
    registry
        .register_condition("equals", |args| Ok(args.first() == args.get(1)))
        .expect("fresh registry");
}
