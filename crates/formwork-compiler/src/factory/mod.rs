//! Node factories: lowering author definitions into AST nodes.
//!
//! The author-facing definition tree is plain JSON. A value is recognized as
//! a definition shape when it is an object whose `"type"` key names a known
//! kind; everything else passes through literally, which is what permits
//! primitive strings, numbers, and plain objects anywhere an expression is
//! accepted.
//!
//! Factories accumulate problems in [`Diagnostics`] instead of failing fast,
//! substituting a `null` literal for each position that could not be
//! lowered, so authors see every structural error in one pass.

mod block;
mod expression;
mod journey;
mod outcome;
mod predicate;
mod step;
mod transition;

#[cfg(test)]
mod factory_tests;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use formwork_core::{
    Diagnostic, DiagnosticKind, Diagnostics, IdCategory, IdGenerator, Node, NodeId, Operand,
    Payload, TransitionKind,
};

pub use journey::lower_journey;

/// Marker returned when a factory could not produce a node. The diagnostic
/// has already been recorded; callers substitute a null literal and carry on.
#[derive(Debug)]
pub struct LowerFailed;

type LowerResult = Result<NodeId, LowerFailed>;

/// Shared lowering state threaded through every factory.
pub struct Lowering<'c> {
    ids: &'c mut IdGenerator,
    pub arena: IndexMap<NodeId, Node>,
    pub diagnostics: &'c mut Diagnostics,
}

impl<'c> Lowering<'c> {
    pub fn new(ids: &'c mut IdGenerator, diagnostics: &'c mut Diagnostics) -> Self {
        Self {
            ids,
            arena: IndexMap::new(),
            diagnostics,
        }
    }

    pub(crate) fn mint(&mut self) -> NodeId {
        self.ids.next(IdCategory::CompileAst)
    }

    pub(crate) fn insert(&mut self, payload: Payload, raw: &Value) -> NodeId {
        let id = self.mint();
        self.arena
            .insert(id.clone(), Node::new(id.clone(), payload, raw.clone()));
        id
    }

    pub(crate) fn invalid(&mut self, path: &str, message: impl Into<String>) {
        self.diagnostics
            .push(Diagnostic::error(DiagnosticKind::InvalidNode, path, message));
    }

    /// Lower an arbitrary author value at an expression position.
    ///
    /// Recognized definition shapes become nodes; failures and unrecognized
    /// values become literals.
    pub fn transform_value(&mut self, value: &Value, path: &str) -> Operand {
        let Some(def) = value.as_object() else {
            return Operand::Literal(value.clone());
        };
        let Some(kind) = def.get("type").and_then(Value::as_str) else {
            return Operand::Literal(value.clone());
        };
        let lowered = match kind {
            "expression" => expression::lower(self, def, value, path),
            "predicate" => predicate::lower(self, def, value, path),
            "transition" => transition::lower(self, def, value, path, None),
            "outcome" => outcome::lower(self, def, value, path),
            "journey" => journey::lower(self, def, value, path),
            "step" => step::lower(self, def, value, path),
            "block" => block::lower(self, def, value, path),
            _ => return Operand::Literal(value.clone()),
        };
        match lowered {
            Ok(id) => Operand::Node(id),
            Err(LowerFailed) => Operand::null(),
        }
    }
}

// ---------------------------------------------------------------------------
// Field access helpers
// ---------------------------------------------------------------------------

pub(crate) fn req_str(
    lowering: &mut Lowering<'_>,
    def: &Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<String, LowerFailed> {
    match def.get(key).and_then(Value::as_str) {
        Some(s) if !s.is_empty() => Ok(s.to_owned()),
        _ => {
            lowering.invalid(path, format!("missing required string property `{key}`"));
            Err(LowerFailed)
        }
    }
}

pub(crate) fn opt_str(def: &Map<String, Value>, key: &str) -> Option<String> {
    def.get(key).and_then(Value::as_str).map(str::to_owned)
}

/// Strict-true boolean: anything but a literal `true` reads as `false`.
pub(crate) fn strict_true(def: &Map<String, Value>, key: &str) -> bool {
    matches!(def.get(key), Some(Value::Bool(true)))
}

pub(crate) fn opt_transform(
    lowering: &mut Lowering<'_>,
    def: &Map<String, Value>,
    key: &str,
    path: &str,
) -> Option<Operand> {
    def.get(key)
        .map(|value| lowering.transform_value(value, &format!("{path}.{key}")))
}

pub(crate) fn transform_list(
    lowering: &mut Lowering<'_>,
    def: &Map<String, Value>,
    key: &str,
    path: &str,
) -> Vec<Operand> {
    let Some(items) = def.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .map(|(index, item)| lowering.transform_value(item, &format!("{path}.{key}[{index}]")))
        .collect()
}

pub(crate) fn transform_metadata(
    lowering: &mut Lowering<'_>,
    def: &Map<String, Value>,
    key: &str,
    path: &str,
) -> IndexMap<String, Operand> {
    let mut out = IndexMap::new();
    if let Some(entries) = def.get(key).and_then(Value::as_object) {
        for (entry_key, entry_value) in entries {
            let operand =
                lowering.transform_value(entry_value, &format!("{path}.{key}.{entry_key}"));
            out.insert(entry_key.clone(), operand);
        }
    }
    out
}

/// Lower a list of transition definitions at a lifecycle position; entries
/// without an explicit `transitionType` take the positional default.
pub(crate) fn transition_list(
    lowering: &mut Lowering<'_>,
    def: &Map<String, Value>,
    key: &str,
    default_kind: TransitionKind,
    path: &str,
) -> Vec<NodeId> {
    let Some(items) = def.get(key).and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let item_path = format!("{path}.{key}[{index}]");
        let Some(item_def) = item.as_object() else {
            lowering.invalid(&item_path, "transition must be an object");
            continue;
        };
        if let Ok(id) = transition::lower(lowering, item_def, item, &item_path, Some(default_kind))
        {
            out.push(id);
        }
    }
    out
}

/// Lower a list of effect function definitions.
pub(crate) fn effect_list(
    lowering: &mut Lowering<'_>,
    items: Option<&Value>,
    path: &str,
) -> Vec<NodeId> {
    let Some(items) = items.and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let item_path = format!("{path}[{index}]");
        if let Ok(id) = expression::lower_function_like(
            lowering,
            item,
            &item_path,
            formwork_core::FunctionRole::Effect,
        ) {
            out.push(id);
        }
    }
    out
}

/// Lower a list of transformer function definitions (pipeline steps,
/// formatters). String entries are shorthand for an argument-less call.
pub(crate) fn transformer_list(
    lowering: &mut Lowering<'_>,
    items: Option<&Value>,
    path: &str,
) -> Vec<NodeId> {
    let Some(items) = items.and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let item_path = format!("{path}[{index}]");
        if let Ok(id) = expression::lower_function_like(
            lowering,
            item,
            &item_path,
            formwork_core::FunctionRole::Transformer,
        ) {
            out.push(id);
        }
    }
    out
}
