//! Built-in Function Library
//!
//! Pure content transforms that run in-process. Each entry of the registry
//! maps the name used in a workflow's `function` field to a plain function
//! taking the current content and the step options.
//!
//! - [`case`]: `toUpperCase` / `toLowerCase`
//! - [`template`]: `{{ key }}` placeholder substitution

pub mod case;
pub mod template;

use serde_json::{Map, Value};

use crate::error::{FlowError, Result};

/// Signature shared by every built-in.
pub type BuiltinFn = fn(Value, &Map<String, Value>) -> Value;

const REGISTRY: &[(&str, BuiltinFn)] = &[
    ("toUpperCase", case::to_upper_case),
    ("toLowerCase", case::to_lower_case),
    ("template", template::render),
];

/// Looks up a built-in by its registered name.
pub fn lookup(name: &str) -> Option<BuiltinFn> {
    REGISTRY
        .iter()
        .find(|(registered, _)| *registered == name)
        .map(|(_, function)| *function)
}

/// Returns true if `name` is a registered built-in.
pub fn is_builtin(name: &str) -> bool {
    lookup(name).is_some()
}

/// Names of all registered built-ins, in registration order.
pub fn names() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|(name, _)| *name)
}

/// Applies the named built-in to `content`.
pub fn apply(name: &str, content: Value, options: &Map<String, Value>) -> Result<Value> {
    let function = lookup(name).ok_or_else(|| FlowError::UnknownBuiltinFunction(name.to_string()))?;
    Ok(function(content, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registry_names() {
        let names: Vec<_> = names().collect();
        assert_eq!(names, vec!["toUpperCase", "toLowerCase", "template"]);
    }

    #[test]
    fn test_is_builtin_is_case_sensitive() {
        assert!(is_builtin("toUpperCase"));
        assert!(!is_builtin("touppercase"));
        assert!(!is_builtin(""));
    }

    #[test]
    fn test_apply_unknown_builtin() {
        let err = apply("reverse", json!("abc"), &Map::new()).unwrap_err();
        assert!(matches!(err, FlowError::UnknownBuiltinFunction(ref name) if name == "reverse"));
    }

    #[test]
    fn test_apply_object_uppercases_only_strings() {
        let result = apply("toUpperCase", json!({"id": 1, "name": "Alice"}), &Map::new()).unwrap();
        assert_eq!(result, json!({"id": 1, "name": "ALICE"}));
    }

    #[test]
    fn test_apply_uppercase_is_idempotent() {
        let once = apply("toUpperCase", json!("ALREADY LOUD"), &Map::new()).unwrap();
        let twice = apply("toUpperCase", once.clone(), &Map::new()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(twice, json!("ALREADY LOUD"));
    }

    #[test]
    fn test_apply_template() {
        let mut options = Map::new();
        options.insert("name".to_string(), json!("World"));

        let result = apply("template", json!("Hello {{ name }}"), &options).unwrap();
        assert_eq!(result, json!("Hello World"));
    }
}
