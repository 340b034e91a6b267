//! Output formatting

use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use super::custom::CustomConfig;
use super::extension_of;
use crate::error::FlowError;
use crate::logging::Logger;

/// Serialises `value` for writing to `path`.
///
/// A custom formatter is looked up by the output extension, then by
/// `defaultFormat`, then by `"default"`. If it fails a warning is logged
/// and the default formatting is used.
pub fn format_value(value: &Value, path: &Path, custom: &CustomConfig, logger: &dyn Logger) -> String {
    let extension = extension_of(path);

    if let Some((key, formatter)) = custom.formatter_for(&extension) {
        match formatter.format(value) {
            Ok(text) => return text,
            Err(e) => {
                let failure = FlowError::CustomFormatterFailure {
                    key,
                    detail: e.to_string(),
                };
                logger.warn(&format!(
                    "{} ({}); using default formatter",
                    failure,
                    path.display()
                ));
            }
        }
    }

    format_default(value, custom.json_indent)
}

/// Objects and arrays become JSON indented by `indent` spaces (compact when
/// zero); strings are written verbatim; other scalars use their JSON text.
pub fn format_default(value: &Value, indent: usize) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(_) | Value::Object(_) => to_indented_json(value, indent),
        other => other.to_string(),
    }
}

fn to_indented_json(value: &Value, indent: usize) -> String {
    if indent == 0 {
        return value.to_string();
    }

    let spaces = " ".repeat(indent);
    let mut buffer = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(spaces.as_bytes()));

    match value.serialize(&mut serializer) {
        Ok(()) => String::from_utf8(buffer).unwrap_or_else(|_| value.to_string()),
        Err(_) => value.to_string(),
    }
}
