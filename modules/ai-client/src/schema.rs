use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Trait for types that can be extracted as forced tool output.
///
/// Automatically implemented for any type that implements
/// `JsonSchema + DeserializeOwned`.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    /// Generate a tool input schema for this type.
    ///
    /// Forced tool calls behave best when the schema is strict:
    /// 1. `additionalProperties: false` on all object schemas
    /// 2. ALL properties listed in `required`, even nullable ones
    /// 3. Fully inlined schemas (no `$ref` references)
    fn tool_schema() -> Value {
        let schema = schema_for!(Self);
        let mut value = serde_json::to_value(schema).unwrap_or_default();

        strict_objects(&mut value);
        inline_refs(&mut value);

        if let Value::Object(map) = &mut value {
            map.remove("$schema");
        }

        value
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

/// Stamp every object schema with `additionalProperties: false` and a
/// `required` list covering all of its properties.
fn strict_objects(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (_, v) in map.iter_mut() {
                strict_objects(v);
            }
            if map.get("type") == Some(&Value::String("object".to_string())) {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
                if let Some(Value::Object(props)) = map.get("properties") {
                    let keys: Vec<Value> =
                        props.keys().map(|k| Value::String(k.clone())).collect();
                    map.insert("required".to_string(), Value::Array(keys));
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                strict_objects(item);
            }
        }
        _ => {}
    }
}

/// Pop the `definitions` table and splice each definition into the sites
/// that reference it.
fn inline_refs(value: &mut Value) {
    let definitions = match value {
        Value::Object(map) => map.remove("definitions"),
        _ => None,
    };
    if let Some(definitions) = definitions {
        resolve_refs(value, &definitions);
    }
}

fn resolve_refs(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(path)) = map.get("$ref").cloned() {
                if let Some(name) = path.strip_prefix("#/definitions/") {
                    if let Some(def) = definitions.get(name) {
                        *value = def.clone();
                        resolve_refs(value, definitions);
                        return;
                    }
                }
            }

            // schemars wraps a lone $ref in a single-element allOf.
            if let Some(Value::Array(wrapped)) = map.get("allOf").cloned() {
                if let [inner] = wrapped.as_slice() {
                    *value = inner.clone();
                    resolve_refs(value, definitions);
                    return;
                }
            }

            for (_, v) in map.iter_mut() {
                resolve_refs(v, definitions);
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                resolve_refs(item, definitions);
            }
        }
        _ => {}
    }
}
