//! Argument validation against a tool's declared JSON Schema
//!
//! Covers the subset tool schemas here use: `type` (single or list),
//! `required`, `properties`, `additionalProperties`, `enum`, `items`,
//! `minItems` and `maxItems`. Unknown keywords are ignored.

use serde_json::Value;

use crate::core::{BobError, Result};

/// Check `args` against `schema`; any mismatch is `InvalidArguments`
pub fn validate(schema: &Value, args: &Value) -> Result<()> {
    check(schema, args, "arguments").map_err(BobError::InvalidArguments)
}

fn check(schema: &Value, value: &Value, path: &str) -> std::result::Result<(), String> {
    // `true` or an empty schema accepts anything
    let Some(schema) = schema.as_object() else {
        return Ok(());
    };

    if let Some(expected) = schema.get("type") {
        let matches = match expected {
            Value::String(t) => matches_type(t, value),
            Value::Array(types) => types
                .iter()
                .filter_map(Value::as_str)
                .any(|t| matches_type(t, value)),
            _ => true,
        };
        if !matches {
            return Err(format!(
                "{}: expected {}, got {}",
                path,
                expected_name(expected),
                type_name(value)
            ));
        }
    }

    if let Some(Value::Array(allowed)) = schema.get("enum") {
        if !allowed.contains(value) {
            return Err(format!(
                "{}: must be one of {}, got {}",
                path,
                Value::Array(allowed.clone()),
                value
            ));
        }
    }

    match value {
        Value::Object(map) => {
            if let Some(Value::Array(required)) = schema.get("required") {
                if let Some(missing) = required
                    .iter()
                    .filter_map(Value::as_str)
                    .find(|key| !map.contains_key(*key))
                {
                    return Err(format!("{}: missing required property '{}'", path, missing));
                }
            }

            let properties = schema.get("properties").and_then(Value::as_object);
            for (key, item) in map {
                let item_path = format!("{}.{}", path, key);
                match properties.and_then(|p| p.get(key)) {
                    Some(sub) => check(sub, item, &item_path)?,
                    None => match schema.get("additionalProperties") {
                        Some(Value::Bool(false)) => {
                            return Err(format!("{}: unexpected property '{}'", path, key));
                        }
                        Some(sub @ Value::Object(_)) => check(sub, item, &item_path)?,
                        _ => {}
                    },
                }
            }
        }
        Value::Array(items) => {
            let len = items.len() as u64;
            if let Some(min) = schema.get("minItems").and_then(Value::as_u64) {
                if len < min {
                    return Err(format!("{}: expected at least {} items, got {}", path, min, len));
                }
            }
            if let Some(max) = schema.get("maxItems").and_then(Value::as_u64) {
                if len > max {
                    return Err(format!("{}: expected at most {} items, got {}", path, max, len));
                }
            }
            if let Some(item_schema) = schema.get("items") {
                for (i, item) in items.iter().enumerate() {
                    check(item_schema, item, &format!("{}[{}]", path, i))?;
                }
            }
        }
        _ => {}
    }

    Ok(())
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        "number" => value.is_number(),
        "integer" => {
            value.is_i64() || value.is_u64() || value.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        _ => true,
    }
}

fn expected_name(expected: &Value) -> String {
    match expected {
        Value::String(t) => t.clone(),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" or "),
        other => other.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string"},
                "limit": {"type": "integer"},
                "mode": {"type": "string", "enum": ["fast", "slow"]}
            },
            "required": ["path"],
            "additionalProperties": false
        })
    }

    fn message(result: Result<()>) -> String {
        match result {
            Err(BobError::InvalidArguments(msg)) => msg,
            other => panic!("expected InvalidArguments, got {:?}", other),
        }
    }

    #[test]
    fn test_accepts_matching_arguments() {
        assert!(validate(&path_schema(), &json!({"path": "a.txt"})).is_ok());
        assert!(validate(&path_schema(), &json!({"path": "a.txt", "limit": 5, "mode": "fast"})).is_ok());
    }

    #[test]
    fn test_wrong_type() {
        let msg = message(validate(&path_schema(), &json!({"path": 42})));
        assert_eq!(msg, "arguments.path: expected string, got integer");

        let msg = message(validate(&path_schema(), &json!({"path": "a", "limit": 1.5})));
        assert!(msg.contains("arguments.limit"));
    }

    #[test]
    fn test_missing_required() {
        let msg = message(validate(&path_schema(), &json!({})));
        assert!(msg.contains("missing required property 'path'"));
    }

    #[test]
    fn test_additional_properties_false() {
        let msg = message(validate(&path_schema(), &json!({"path": "a", "extra": true})));
        assert!(msg.contains("unexpected property 'extra'"));

        // Extra keys are fine unless the schema closes the object
        let open = json!({"type": "object", "properties": {"path": {"type": "string"}}});
        assert!(validate(&open, &json!({"path": "a", "extra": true})).is_ok());
    }

    #[test]
    fn test_enum() {
        let msg = message(validate(&path_schema(), &json!({"path": "a", "mode": "warp"})));
        assert!(msg.contains("must be one of"));
    }

    #[test]
    fn test_nested_arrays() {
        let schema = json!({
            "type": "object",
            "properties": {
                "items": {
                    "type": "array",
                    "minItems": 1,
                    "maxItems": 2,
                    "items": {
                        "type": "object",
                        "properties": {"label": {"type": "string"}},
                        "required": ["label"]
                    }
                }
            }
        });

        assert!(validate(&schema, &json!({"items": [{"label": "a"}]})).is_ok());
        assert!(message(validate(&schema, &json!({"items": []}))).contains("at least 1"));
        assert!(message(validate(&schema, &json!({"items": [{}, {}, {}]}))).contains("at most 2"));
        assert_eq!(
            message(validate(&schema, &json!({"items": [{"label": 1}]}))),
            "arguments.items[0].label: expected string, got integer"
        );
    }
}
