//! Schema generation utilities.

use serde_json::{json, Map, Value};

/// Generate a JSON schema for `T` using `schemars`.
pub fn json_schema_from_type<T: schemars::JsonSchema>() -> crate::Result<Value> {
    let schema = schemars::schema_for!(T);
    Ok(serde_json::to_value(&schema)?)
}

/// Name used for the `json_schema.name` field of a request.
///
/// OpenAI only accepts `[a-zA-Z0-9_-]` here, so anything else is replaced.
pub fn schema_name_for<T: schemars::JsonSchema>() -> String {
    T::schema_name()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// Rewrite a generated schema into the subset accepted by OpenAI strict mode.
///
/// Every object gets `additionalProperties: false` and lists all of its
/// properties as required; the `$schema` marker is dropped.
pub fn strict_schema(schema: Value) -> Value {
    let mut schema = schema;
    if let Some(obj) = schema.as_object_mut() {
        obj.remove("$schema");
    }
    tighten(&mut schema);
    schema
}

fn tighten(node: &mut Value) {
    match node {
        Value::Object(map) => {
            let is_object = map.get("type").and_then(Value::as_str) == Some("object")
                || map.contains_key("properties");
            if is_object {
                let required: Vec<Value> = map
                    .get("properties")
                    .and_then(Value::as_object)
                    .map(|props| props.keys().map(|k| json!(k)).collect())
                    .unwrap_or_default();
                map.insert("required".into(), Value::Array(required));
                map.insert("additionalProperties".into(), json!(false));
            }
            for key in ["properties", "definitions", "$defs"] {
                if let Some(Value::Object(children)) = map.get_mut(key) {
                    tighten_all(children);
                }
            }
            for key in ["items", "additionalItems"] {
                if let Some(child) = map.get_mut(key) {
                    tighten(child);
                }
            }
            for key in ["anyOf", "allOf", "oneOf"] {
                if let Some(Value::Array(children)) = map.get_mut(key) {
                    children.iter_mut().for_each(tighten);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(tighten),
        _ => {}
    }
}

fn tighten_all(children: &mut Map<String, Value>) {
    for child in children.values_mut() {
        tighten(child);
    }
}
