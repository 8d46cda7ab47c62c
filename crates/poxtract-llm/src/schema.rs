//! Strict JSON schema generation for structured outputs.
//!
//! Schemas come from `schemars` and are rewritten into the subset accepted by
//! strict structured-output mode:
//! 1. `additionalProperties: false` on every object
//! 2. every property listed in `required`, nullable ones included
//! 3. no `$ref`, no `definitions`, no `default`/`format` keywords

use schemars::{JsonSchema, schema_for};
use serde_json::Value;

/// Generate a strict-mode schema for `T`.
pub fn strict_schema<T: JsonSchema>() -> Value {
    let schema = schema_for!(T);
    let mut value = serde_json::to_value(schema).unwrap_or_default();

    inline_refs(&mut value);

    if let Value::Object(map) = &mut value {
        map.remove("definitions");
        map.remove("$schema");
        map.remove("title");
    }

    fix_object_schemas(&mut value);
    value
}

/// Schema name for `T`, used as the `json_schema.name` of a request.
pub fn schema_name<T: JsonSchema>() -> String {
    <T as JsonSchema>::schema_name()
}

fn fix_object_schemas(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove("default");
            map.remove("format");

            if map.get("type") == Some(&Value::String("object".to_string())) {
                map.insert("additionalProperties".to_string(), Value::Bool(false));

                if let Some(Value::Object(props)) = map.get("properties") {
                    let all_keys: Vec<Value> =
                        props.keys().map(|k| Value::String(k.clone())).collect();
                    map.insert("required".to_string(), Value::Array(all_keys));
                }
            }

            // Property names live under "properties"; only recurse into their schemas.
            for (key, v) in map.iter_mut() {
                if key == "properties" {
                    if let Value::Object(props) = v {
                        for prop in props.values_mut() {
                            fix_object_schemas(prop);
                        }
                    }
                } else {
                    fix_object_schemas(v);
                }
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                fix_object_schemas(item);
            }
        }
        _ => {}
    }
}

fn inline_refs(value: &mut Value) {
    let definitions = match value {
        Value::Object(map) => map.get("definitions").cloned(),
        _ => None,
    };

    if let Some(defs) = definitions {
        inline_refs_recursive(value, &defs);
    }
}

fn inline_refs_recursive(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(ref_path)) = map.get("$ref").cloned() {
                if let Some(type_name) = ref_path.strip_prefix("#/definitions/") {
                    if let Some(def) = definitions.get(type_name) {
                        *value = def.clone();
                        inline_refs_recursive(value, definitions);
                        return;
                    }
                }
            }

            for (_, v) in map.iter_mut() {
                inline_refs_recursive(v, definitions);
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                inline_refs_recursive(item, definitions);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use schemars::JsonSchema;
    use serde::Deserialize;

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    struct Line {
        description: String,
        #[serde(default)]
        quantity: u32,
        notes: Option<String>,
    }

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    struct Order {
        lines: Vec<Line>,
        customer: Option<String>,
    }

    #[test]
    fn test_all_properties_required() {
        let schema = strict_schema::<Line>();
        let required = schema["required"].as_array().unwrap();

        assert_eq!(required.len(), 3);
        assert_eq!(schema["additionalProperties"], false);
    }

    #[test]
    fn test_refs_inlined() {
        let schema = strict_schema::<Order>();
        let text = serde_json::to_string(&schema).unwrap();

        assert!(!text.contains("$ref"));
        assert!(!text.contains("definitions"));
        assert_eq!(
            schema["properties"]["lines"]["items"]["additionalProperties"],
            false
        );
    }

    #[test]
    fn test_default_and_format_removed() {
        let schema = strict_schema::<Line>();
        let quantity = &schema["properties"]["quantity"];

        assert!(quantity.get("default").is_none());
        assert!(quantity.get("format").is_none());
    }

    #[test]
    fn test_schema_name() {
        assert_eq!(schema_name::<Order>(), "Order");
    }
}
