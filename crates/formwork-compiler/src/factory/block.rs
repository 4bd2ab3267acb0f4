//! Block factory.
//!
//! A block definition is a field block when it carries a `code`; otherwise
//! it is a basic block that takes no part in validation. Unknown keys are
//! variant-specific parameters and are lowered as expression positions.

use serde_json::{Map, Value};

use formwork_core::{BlockKind, BlockNode, Payload};

use super::{LowerResult, Lowering, expression, opt_str, opt_transform, req_str, strict_true,
    transformer_list};

const KNOWN_KEYS: [&str; 10] = [
    "type",
    "variant",
    "code",
    "value",
    "defaultValue",
    "formatters",
    "hidden",
    "validate",
    "dependent",
    "multiple",
];

pub(crate) fn lower(
    lowering: &mut Lowering<'_>,
    def: &Map<String, Value>,
    raw: &Value,
    path: &str,
) -> LowerResult {
    let variant = req_str(lowering, def, "variant", path)?;
    let code = opt_str(def, "code");
    let kind = if code.is_some() {
        BlockKind::Field
    } else {
        BlockKind::Basic
    };

    let mut validate = Vec::new();
    if let Some(items) = def.get("validate").and_then(Value::as_array) {
        for (index, item) in items.iter().enumerate() {
            let item_path = format!("{path}.validate[{index}]");
            if let Ok(id) = expression::lower_validation_like(lowering, item, &item_path) {
                validate.push(id);
            }
        }
    }

    let mut params = indexmap::IndexMap::new();
    for (key, value) in def {
        if KNOWN_KEYS.contains(&key.as_str()) {
            continue;
        }
        params.insert(
            key.clone(),
            lowering.transform_value(value, &format!("{path}.{key}")),
        );
    }

    let payload = Payload::Block(BlockNode {
        kind,
        variant,
        code,
        value: opt_transform(lowering, def, "value", path),
        default_value: opt_transform(lowering, def, "defaultValue", path),
        formatters: transformer_list(lowering, def.get("formatters"), &format!("{path}.formatters")),
        hidden: opt_transform(lowering, def, "hidden", path),
        validate,
        dependent: opt_transform(lowering, def, "dependent", path),
        multiple: strict_true(def, "multiple"),
        params,
    });
    Ok(lowering.insert(payload, raw))
}
