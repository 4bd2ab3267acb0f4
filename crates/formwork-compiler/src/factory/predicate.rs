//! Predicate factories.

use serde_json::{Map, Value};

use formwork_core::{Operand, Payload, PredicateKind, PredicatePayload};

use super::{LowerFailed, LowerResult, Lowering, strict_true, transform_list};

pub(crate) fn lower(
    lowering: &mut Lowering<'_>,
    def: &Map<String, Value>,
    raw: &Value,
    path: &str,
) -> LowerResult {
    let Some(kind) = def.get("predicateType").and_then(Value::as_str) else {
        lowering.invalid(path, "predicate is missing `predicateType`");
        return Err(LowerFailed);
    };
    match kind {
        "test" => lower_test(lowering, def, raw, path),
        "and" => lower_composite(lowering, def, raw, path, PredicateKind::And),
        "or" => lower_composite(lowering, def, raw, path, PredicateKind::Or),
        "xor" => lower_composite(lowering, def, raw, path, PredicateKind::Xor),
        "not" => lower_not(lowering, def, raw, path),
        other => {
            lowering.invalid(path, format!("unknown predicateType `{other}`"));
            Err(LowerFailed)
        }
    }
}

fn lower_test(
    lowering: &mut Lowering<'_>,
    def: &Map<String, Value>,
    raw: &Value,
    path: &str,
) -> LowerResult {
    let Some(subject) = def.get("subject") else {
        lowering.invalid(path, "test predicate requires a `subject`");
        return Err(LowerFailed);
    };
    let Some(condition) = def.get("condition") else {
        lowering.invalid(path, "test predicate requires a `condition`");
        return Err(LowerFailed);
    };
    let subject = lowering.transform_value(subject, &format!("{path}.subject"));
    let condition = lowering.transform_value(condition, &format!("{path}.condition"));
    let payload = Payload::Predicate(PredicatePayload::Test {
        subject,
        condition,
        negate: strict_true(def, "negate"),
    });
    Ok(lowering.insert(payload, raw))
}

fn lower_composite(
    lowering: &mut Lowering<'_>,
    def: &Map<String, Value>,
    raw: &Value,
    path: &str,
    kind: PredicateKind,
) -> LowerResult {
    let operands: Vec<Operand> = transform_list(lowering, def, "operands", path);
    if operands.is_empty() {
        lowering.invalid(path, "composite predicate requires at least one operand");
        return Err(LowerFailed);
    }
    let payload = Payload::Predicate(PredicatePayload::Composite { kind, operands });
    Ok(lowering.insert(payload, raw))
}

fn lower_not(
    lowering: &mut Lowering<'_>,
    def: &Map<String, Value>,
    raw: &Value,
    path: &str,
) -> LowerResult {
    let Some(operand) = def.get("operand") else {
        lowering.invalid(path, "not predicate requires an `operand`");
        return Err(LowerFailed);
    };
    let operand = lowering.transform_value(operand, &format!("{path}.operand"));
    let payload = Payload::Predicate(PredicatePayload::Not { operand });
    Ok(lowering.insert(payload, raw))
}
