//! Step factory.

use serde_json::{Map, Value};

use formwork_core::{Payload, StepNode, TransitionKind};

use super::{
    LowerFailed, LowerResult, Lowering, block, opt_transform, req_str, strict_true,
    transform_metadata, transition_list,
};

pub(crate) fn lower(
    lowering: &mut Lowering<'_>,
    def: &Map<String, Value>,
    raw: &Value,
    path: &str,
) -> LowerResult {
    let step_path = req_str(lowering, def, "path", path)?;
    let title = match def.get("title") {
        Some(title) => lowering.transform_value(title, &format!("{path}.title")),
        None => {
            lowering.invalid(path, "missing required property `title`");
            return Err(LowerFailed);
        }
    };

    let mut blocks = Vec::new();
    if let Some(items) = def.get("blocks").and_then(Value::as_array) {
        for (index, item) in items.iter().enumerate() {
            let item_path = format!("{path}.blocks[{index}]");
            let Some(item_def) = item.as_object() else {
                lowering.invalid(&item_path, "block definition must be an object");
                continue;
            };
            if let Ok(id) = block::lower(lowering, item_def, item, &item_path) {
                blocks.push(id);
            }
        }
    }

    let payload = Payload::Step(StepNode {
        path: step_path,
        title,
        description: opt_transform(lowering, def, "description", path),
        on_load: transition_list(lowering, def, "onLoad", TransitionKind::Load, path),
        on_access: transition_list(lowering, def, "onAccess", TransitionKind::Access, path),
        on_action: transition_list(lowering, def, "onAction", TransitionKind::Action, path),
        on_submission: transition_list(
            lowering,
            def,
            "onSubmission",
            TransitionKind::Submit,
            path,
        ),
        blocks,
        is_entry_point: strict_true(def, "isEntryPoint"),
        backlink: opt_transform(lowering, def, "backlink", path),
        metadata: transform_metadata(lowering, def, "metadata", path),
    });
    Ok(lowering.insert(payload, raw))
}
