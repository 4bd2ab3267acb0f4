//! Journey factory.

use serde_json::{Map, Value};

use formwork_core::{JourneyNode, NodeId, Payload, TransitionKind};

use super::{
    LowerFailed, LowerResult, Lowering, opt_str, opt_transform, req_str, step, transform_metadata,
    transition_list,
};

/// Lower a top-level journey definition.
pub fn lower_journey(lowering: &mut Lowering<'_>, definition: &Value) -> LowerResult {
    let Some(def) = definition.as_object() else {
        lowering.invalid("journey", "journey definition must be an object");
        return Err(LowerFailed);
    };
    lower(lowering, def, definition, "journey")
}

pub(crate) fn lower(
    lowering: &mut Lowering<'_>,
    def: &Map<String, Value>,
    raw: &Value,
    path: &str,
) -> LowerResult {
    let journey_path = req_str(lowering, def, "path", path)?;
    let code = req_str(lowering, def, "code", path)?;
    let title = match def.get("title") {
        Some(title) => lowering.transform_value(title, &format!("{path}.title")),
        None => {
            lowering.invalid(path, "missing required property `title`");
            return Err(LowerFailed);
        }
    };

    let description = opt_transform(lowering, def, "description", path);
    let on_load = transition_list(lowering, def, "onLoad", TransitionKind::Load, path);
    let on_access = transition_list(lowering, def, "onAccess", TransitionKind::Access, path);

    let mut steps = Vec::new();
    if let Some(items) = def.get("steps").and_then(Value::as_array) {
        for (index, item) in items.iter().enumerate() {
            let item_path = format!("{path}.steps[{index}]");
            let Some(item_def) = item.as_object() else {
                lowering.invalid(&item_path, "step definition must be an object");
                continue;
            };
            if let Ok(id) = step::lower(lowering, item_def, item, &item_path) {
                steps.push(id);
            }
        }
    }

    let mut children: Vec<NodeId> = Vec::new();
    if let Some(items) = def.get("children").and_then(Value::as_array) {
        for (index, item) in items.iter().enumerate() {
            let item_path = format!("{path}.children[{index}]");
            let Some(item_def) = item.as_object() else {
                lowering.invalid(&item_path, "nested journey must be an object");
                continue;
            };
            if let Ok(id) = lower(lowering, item_def, item, &item_path) {
                children.push(id);
            }
        }
    }

    let payload = Payload::Journey(JourneyNode {
        path: journey_path,
        code,
        title,
        description,
        version: opt_str(def, "version"),
        entry_path: opt_str(def, "entryPath"),
        on_load,
        on_access,
        steps,
        children,
        metadata: transform_metadata(lowering, def, "metadata", path),
    });
    Ok(lowering.insert(payload, raw))
}
