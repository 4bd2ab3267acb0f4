//! Expression factories, one per `expressionType`.

use serde_json::{Map, Value};

use formwork_core::{
    CollectionNode, ConditionalNode, FormatNode, FunctionNode, FunctionRole, IterateNode,
    IteratorKind, NextNode, Operand, Payload, PipelineNode, ReferenceNode, ValidationNode,
};

use super::{
    LowerFailed, LowerResult, Lowering, block, opt_transform, req_str, strict_true,
    transform_list, transformer_list,
};

pub(crate) fn lower(
    lowering: &mut Lowering<'_>,
    def: &Map<String, Value>,
    raw: &Value,
    path: &str,
) -> LowerResult {
    let Some(kind) = def.get("expressionType").and_then(Value::as_str) else {
        lowering.invalid(path, "expression is missing `expressionType`");
        return Err(LowerFailed);
    };
    match kind {
        "reference" => lower_reference(lowering, def, raw, path),
        "function" => lower_function(lowering, def, raw, path, None),
        "pipeline" => lower_pipeline(lowering, def, raw, path),
        "format" => lower_format(lowering, def, raw, path),
        "iterate" => lower_iterate(lowering, def, raw, path),
        "collection" => lower_collection(lowering, def, raw, path),
        "conditional" => lower_conditional(lowering, def, raw, path),
        "validation" => lower_validation(lowering, def, raw, path),
        "next" => lower_next(lowering, def, raw, path),
        other => {
            lowering.invalid(path, format!("unknown expressionType `{other}`"));
            Err(LowerFailed)
        }
    }
}

fn lower_reference(
    lowering: &mut Lowering<'_>,
    def: &Map<String, Value>,
    raw: &Value,
    path: &str,
) -> LowerResult {
    let segments: Vec<String> = match def.get("path").and_then(Value::as_array) {
        Some(items) if !items.is_empty() => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item.as_str() {
                    Some(segment) => out.push(segment.to_owned()),
                    None => {
                        lowering.invalid(path, "reference path segments must be strings");
                        return Err(LowerFailed);
                    }
                }
            }
            out
        }
        _ => {
            lowering.invalid(path, "reference requires a non-empty `path` array");
            return Err(LowerFailed);
        }
    };
    let payload = Payload::Reference(ReferenceNode {
        path: segments,
        base: opt_transform(lowering, def, "base", path),
    });
    Ok(lowering.insert(payload, raw))
}

fn lower_function(
    lowering: &mut Lowering<'_>,
    def: &Map<String, Value>,
    raw: &Value,
    path: &str,
    forced_role: Option<FunctionRole>,
) -> LowerResult {
    let name = req_str(lowering, def, "name", path)?;
    let role = forced_role.unwrap_or_else(|| {
        match def.get("functionType").and_then(Value::as_str) {
            Some("condition") => FunctionRole::Condition,
            Some("effect") => FunctionRole::Effect,
            _ => FunctionRole::Transformer,
        }
    });
    let payload = Payload::Function(FunctionNode {
        name,
        role,
        arguments: transform_list(lowering, def, "arguments", path),
    });
    Ok(lowering.insert(payload, raw))
}

/// Lower a value at a function position: a full expression definition, a
/// `{name, arguments}` shorthand, or a bare string naming an argument-less
/// call. The role is fixed by the position (pipeline step, formatter,
/// effect list).
pub(crate) fn lower_function_like(
    lowering: &mut Lowering<'_>,
    value: &Value,
    path: &str,
    role: FunctionRole,
) -> LowerResult {
    match value {
        Value::String(name) => {
            let payload = Payload::Function(FunctionNode {
                name: name.clone(),
                role,
                arguments: Vec::new(),
            });
            Ok(lowering.insert(payload, value))
        }
        Value::Object(def) => {
            if let Some("expression") = def.get("type").and_then(Value::as_str) {
                match def.get("expressionType").and_then(Value::as_str) {
                    Some("function") => lower_function(lowering, def, value, path, Some(role)),
                    _ => {
                        lowering.invalid(path, "expected a function expression at this position");
                        Err(LowerFailed)
                    }
                }
            } else if def.contains_key("name") {
                lower_function(lowering, def, value, path, Some(role))
            } else {
                lowering.invalid(path, "expected a function definition at this position");
                Err(LowerFailed)
            }
        }
        _ => {
            lowering.invalid(path, "expected a function definition at this position");
            Err(LowerFailed)
        }
    }
}

/// Lower a value at a validation position: a full expression definition or a
/// `{when, message, ...}` shorthand.
pub(crate) fn lower_validation_like(
    lowering: &mut Lowering<'_>,
    value: &Value,
    path: &str,
) -> LowerResult {
    match value {
        Value::Object(def) => {
            if let Some("expression") = def.get("type").and_then(Value::as_str) {
                match def.get("expressionType").and_then(Value::as_str) {
                    Some("validation") => lower_validation(lowering, def, value, path),
                    _ => {
                        lowering.invalid(path, "expected a validation expression at this position");
                        Err(LowerFailed)
                    }
                }
            } else if def.contains_key("when") {
                lower_validation(lowering, def, value, path)
            } else {
                lowering.invalid(path, "validation requires a `when` predicate");
                Err(LowerFailed)
            }
        }
        _ => {
            lowering.invalid(path, "expected a validation definition at this position");
            Err(LowerFailed)
        }
    }
}

fn lower_pipeline(
    lowering: &mut Lowering<'_>,
    def: &Map<String, Value>,
    raw: &Value,
    path: &str,
) -> LowerResult {
    let Some(input) = def.get("input") else {
        lowering.invalid(path, "pipeline requires an `input`");
        return Err(LowerFailed);
    };
    let input = lowering.transform_value(input, &format!("{path}.input"));
    let steps = transformer_list(lowering, def.get("steps"), &format!("{path}.steps"));
    let payload = Payload::Pipeline(PipelineNode { input, steps });
    Ok(lowering.insert(payload, raw))
}

fn lower_format(
    lowering: &mut Lowering<'_>,
    def: &Map<String, Value>,
    raw: &Value,
    path: &str,
) -> LowerResult {
    let template = req_str(lowering, def, "template", path)?;
    let payload = Payload::Format(FormatNode {
        template,
        arguments: transform_list(lowering, def, "arguments", path),
    });
    Ok(lowering.insert(payload, raw))
}

fn lower_iterate(
    lowering: &mut Lowering<'_>,
    def: &Map<String, Value>,
    raw: &Value,
    path: &str,
) -> LowerResult {
    let Some(input) = def.get("input") else {
        lowering.invalid(path, "iterate requires an `input`");
        return Err(LowerFailed);
    };
    let iterator = match def.get("iterator").and_then(Value::as_str) {
        Some("map") => IteratorKind::Map,
        Some("filter") => IteratorKind::Filter,
        Some("find") => IteratorKind::Find,
        _ => {
            lowering.invalid(path, "iterate requires an `iterator` of map, filter or find");
            return Err(LowerFailed);
        }
    };
    let Some(expression) = def.get("expression") else {
        lowering.invalid(path, "iterate requires an `expression`");
        return Err(LowerFailed);
    };
    let input = lowering.transform_value(input, &format!("{path}.input"));
    let expression = lowering.transform_value(expression, &format!("{path}.expression"));
    let payload = Payload::Iterate(IterateNode {
        input,
        iterator,
        expression,
    });
    Ok(lowering.insert(payload, raw))
}

fn lower_collection(
    lowering: &mut Lowering<'_>,
    def: &Map<String, Value>,
    raw: &Value,
    path: &str,
) -> LowerResult {
    let Some(collection) = def.get("collection") else {
        lowering.invalid(path, "collection requires a `collection` input");
        return Err(LowerFailed);
    };
    let collection = lowering.transform_value(collection, &format!("{path}.collection"));
    let template = match def.get("template") {
        Some(template_value @ Value::Object(template_def)) => block::lower(
            lowering,
            template_def,
            template_value,
            &format!("{path}.template"),
        )?,
        _ => {
            lowering.invalid(path, "collection requires a block `template`");
            return Err(LowerFailed);
        }
    };
    let payload = Payload::Collection(CollectionNode {
        collection,
        template,
        fallback: opt_transform(lowering, def, "fallback", path),
    });
    Ok(lowering.insert(payload, raw))
}

fn lower_conditional(
    lowering: &mut Lowering<'_>,
    def: &Map<String, Value>,
    raw: &Value,
    path: &str,
) -> LowerResult {
    let Some(predicate) = def.get("predicate") else {
        lowering.invalid(path, "conditional requires a `predicate`");
        return Err(LowerFailed);
    };
    let predicate = lowering.transform_value(predicate, &format!("{path}.predicate"));
    // Missing branches default to literal true/false.
    let then_value = opt_transform(lowering, def, "thenValue", path)
        .unwrap_or(Operand::Literal(Value::Bool(true)));
    let else_value = opt_transform(lowering, def, "elseValue", path)
        .unwrap_or(Operand::Literal(Value::Bool(false)));
    let payload = Payload::Conditional(ConditionalNode {
        predicate,
        then_value,
        else_value,
    });
    Ok(lowering.insert(payload, raw))
}

fn lower_validation(
    lowering: &mut Lowering<'_>,
    def: &Map<String, Value>,
    raw: &Value,
    path: &str,
) -> LowerResult {
    let Some(when) = def.get("when") else {
        lowering.invalid(path, "validation requires a `when` predicate");
        return Err(LowerFailed);
    };
    let when = lowering.transform_value(when, &format!("{path}.when"));
    let message = opt_transform(lowering, def, "message", path).unwrap_or(Operand::null());
    let payload = Payload::Validation(ValidationNode {
        when,
        message,
        submission_only: strict_true(def, "submissionOnly"),
        details: opt_transform(lowering, def, "details", path),
    });
    Ok(lowering.insert(payload, raw))
}

fn lower_next(
    lowering: &mut Lowering<'_>,
    def: &Map<String, Value>,
    raw: &Value,
    path: &str,
) -> LowerResult {
    let Some(goto) = def.get("goto") else {
        lowering.invalid(path, "next requires a `goto`");
        return Err(LowerFailed);
    };
    let goto = lowering.transform_value(goto, &format!("{path}.goto"));
    let payload = Payload::Next(NextNode {
        goto,
        when: opt_transform(lowering, def, "when", path),
    });
    Ok(lowering.insert(payload, raw))
}
