use schemars::{schema_for, JsonSchema};
use serde_json::Value;

/// Schema keys outside the OpenAPI subset Gemini accepts
const UNSUPPORTED_KEYS: &[&str] = &[
    "$schema",
    "title",
    "format",
    "examples",
    "additionalProperties",
    "definitions",
    "$defs",
];

/// JSON schema for a function's arguments, trimmed for Gemini
///
/// `schemars` emits draft-07 output; the function-declaration endpoint
/// only understands a small OpenAPI subset, so metadata keys are
/// stripped and nullable unions like `["string", "null"]` collapse to
/// their non-null type.
pub fn parameters_for<T: JsonSchema>() -> Value {
    let schema = schema_for!(T);
    let mut value = serde_json::to_value(schema).unwrap_or_else(|_| Value::Null);
    sanitize(&mut value);
    value
}

fn sanitize(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for key in UNSUPPORTED_KEYS {
                map.remove(*key);
            }
            if let Some(type_value) = map.get_mut("type") {
                collapse_nullable_type(type_value);
            }
            for child in map.values_mut() {
                sanitize(child);
            }
        }
        Value::Array(items) => {
            for item in items {
                sanitize(item);
            }
        }
        _ => {}
    }
}

fn collapse_nullable_type(type_value: &mut Value) {
    let Value::Array(types) = type_value else {
        return;
    };
    let non_null = types
        .iter()
        .find(|t| t.as_str() != Some("null"))
        .cloned()
        .unwrap_or(Value::String("string".to_string()));
    *type_value = non_null;
}
