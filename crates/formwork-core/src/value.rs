//! Value helpers shared by the compiler and the evaluator.
//!
//! Evaluated values are plain [`serde_json::Value`]s. "Undefined" is not a
//! JSON value; the evaluator models it as `Option<Value>` with `None`
//! meaning undefined, which these helpers mirror.

use serde_json::Value;

/// Keys that must never be traversed during reference resolution.
pub const DANGEROUS_KEYS: [&str; 3] = ["__proto__", "prototype", "constructor"];

pub fn is_dangerous_key(key: &str) -> bool {
    DANGEROUS_KEYS.contains(&key)
}

/// Language-independent truthiness.
///
/// Falsy: `null`, `false`, numeric zero (including negative zero and any
/// non-finite float), and the empty string. Arrays and objects are always
/// truthy, empty or not.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i != 0
            } else if let Some(u) = n.as_u64() {
                u != 0
            } else {
                n.as_f64().is_some_and(|f| f != 0.0 && f.is_finite())
            }
        }
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Truthiness over an optional value; undefined is falsy.
pub fn is_truthy_opt(value: Option<&Value>) -> bool {
    value.is_some_and(is_truthy)
}

/// Navigate `segments` into `root`, one key or index at a time.
///
/// Object keys and numeric array indices are both supported. Dangerous keys
/// resolve to undefined without being traversed. Any miss resolves the whole
/// lookup to undefined.
pub fn lookup_path<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    let mut current = root;
    for segment in segments {
        if is_dangerous_key(segment) {
            return None;
        }
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => {
                let index: usize = segment.parse().ok()?;
                items.get(index)?
            }
            _ => return None,
        };
    }
    Some(current)
}

/// Render a value for positional template substitution.
///
/// Strings are inserted as-is; scalars via their display form; `null` and
/// undefined become the empty string; arrays and objects use compact JSON.
pub fn to_display_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(composite) => composite.to_string(),
    }
}
