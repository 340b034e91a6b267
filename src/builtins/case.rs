//! Case folding built-ins.
//!
//! Strings are converted directly. Arrays and objects are converted one
//! level deep: string elements or string properties change, every other
//! value is passed through untouched.

use serde_json::{Map, Value};

pub fn to_upper_case(content: Value, _options: &Map<String, Value>) -> Value {
    map_strings(content, |s| s.to_uppercase())
}

pub fn to_lower_case(content: Value, _options: &Map<String, Value>) -> Value {
    map_strings(content, |s| s.to_lowercase())
}

fn map_strings(content: Value, convert: fn(&str) -> String) -> Value {
    let convert_leaf = |value: Value| match value {
        Value::String(s) => Value::String(convert(&s)),
        other => other,
    };

    match content {
        Value::String(s) => Value::String(convert(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(convert_leaf).collect()),
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(key, value)| (key, convert_leaf(value)))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_options() -> Map<String, Value> {
        Map::new()
    }

    #[test]
    fn test_upper_string() {
        assert_eq!(to_upper_case(json!("hello"), &no_options()), json!("HELLO"));
    }

    #[test]
    fn test_lower_string() {
        assert_eq!(to_lower_case(json!("HeLLo"), &no_options()), json!("hello"));
    }

    #[test]
    fn test_upper_array_skips_non_strings() {
        let result = to_upper_case(json!(["a", 1, null, {"k": "v"}, "b"]), &no_options());
        assert_eq!(result, json!(["A", 1, null, {"k": "v"}, "B"]));
    }

    #[test]
    fn test_lower_object_only_top_level() {
        let result = to_lower_case(
            json!({"Name": "ALICE", "Tags": ["X"], "Age": 30}),
            &no_options(),
        );
        assert_eq!(result, json!({"Name": "alice", "Tags": ["X"], "Age": 30}));
    }

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(to_upper_case(json!(42), &no_options()), json!(42));
        assert_eq!(to_upper_case(json!(true), &no_options()), json!(true));
        assert_eq!(to_upper_case(Value::Null, &no_options()), Value::Null);
    }

    #[test]
    fn test_unicode_case() {
        assert_eq!(to_upper_case(json!("straße"), &no_options()), json!("STRASSE"));
    }

    #[test]
    fn test_object_key_order_preserved() {
        let result = to_upper_case(json!({"b": "x", "a": "y"}), &no_options());
        let keys: Vec<_> = result.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
