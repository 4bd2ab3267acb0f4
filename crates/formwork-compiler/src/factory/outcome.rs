//! Outcome factory.

use serde_json::{Map, Value};

use formwork_core::{NodeId, OutcomeKind, OutcomeNode, Payload};

use super::{LowerFailed, LowerResult, Lowering, opt_transform};

const DEFAULT_ERROR_STATUS: u16 = 500;

pub(crate) fn lower(
    lowering: &mut Lowering<'_>,
    def: &Map<String, Value>,
    raw: &Value,
    path: &str,
) -> LowerResult {
    let kind = match def.get("outcomeType").and_then(Value::as_str) {
        Some("redirect") => OutcomeKind::Redirect,
        Some("throwError") => OutcomeKind::ThrowError,
        Some(other) => {
            lowering.invalid(path, format!("unknown outcomeType `{other}`"));
            return Err(LowerFailed);
        }
        None => {
            lowering.invalid(path, "outcome is missing `outcomeType`");
            return Err(LowerFailed);
        }
    };

    let goto = opt_transform(lowering, def, "goto", path);
    if kind == OutcomeKind::Redirect && goto.is_none() {
        lowering.invalid(path, "redirect outcome requires a `goto`");
        return Err(LowerFailed);
    }

    let status = match def.get("status") {
        Some(Value::Number(n)) => n.as_u64().and_then(|s| u16::try_from(s).ok()).unwrap_or_else(
            || {
                lowering.invalid(path, "outcome `status` must be an HTTP status code");
                DEFAULT_ERROR_STATUS
            },
        ),
        _ => DEFAULT_ERROR_STATUS,
    };

    let payload = Payload::Outcome(OutcomeNode {
        kind,
        goto,
        status,
        message: opt_transform(lowering, def, "message", path),
        when: opt_transform(lowering, def, "when", path),
    });
    Ok(lowering.insert(payload, raw))
}

/// Lower a list of outcome definitions at a `next`/`redirect` position.
pub(crate) fn outcome_list(
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
        let Some(def) = item.as_object() else {
            lowering.invalid(&item_path, "outcome must be an object");
            continue;
        };
        if let Ok(id) = lower(lowering, def, item, &item_path) {
            out.push(id);
        }
    }
    out
}
