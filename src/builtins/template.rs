//! `{{ key }}` placeholder substitution.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([^{}]*?)\s*\}\}").expect("placeholder pattern is valid")
});

/// Replaces every `{{ key }}` in string content with `options[key]`.
///
/// Placeholders without a matching option are left as written. Non-string
/// content is returned unchanged.
pub fn render(content: Value, options: &Map<String, Value>) -> Value {
    match content {
        Value::String(text) => Value::String(render_str(&text, options)),
        other => other,
    }
}

/// String form of [`render`].
pub fn render_str(text: &str, options: &Map<String, Value>) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures| match options.get(&caps[1]) {
            Some(value) => stringify(value),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
