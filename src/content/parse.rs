//! Input parsing
//!
//! Default rules by extension: `.json` is parsed strictly, `.csv` is split
//! into an array of row objects keyed by the header, and anything else is
//! kept as raw text. A custom parser registered for the extension takes
//! precedence; if it fails the default rule is applied instead.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use super::custom::CustomConfig;
use super::extension_of;
use crate::error::{FlowError, Result};
use crate::logging::Logger;

/// Reads and parses `path` into a content value.
pub fn parse_file(path: &Path, custom: &CustomConfig, logger: &dyn Logger) -> Result<Value> {
    let raw = fs::read_to_string(path)
        .map_err(|e| FlowError::io(format!("failed to read '{}'", path.display()), e))?;
    parse_text(&raw, path, custom, logger)
}

/// Parses already-read text using the extension of `path`.
pub fn parse_text(
    raw: &str,
    path: &Path,
    custom: &CustomConfig,
    logger: &dyn Logger,
) -> Result<Value> {
    let extension = extension_of(path);

    if let Some(parser) = custom.parser_for(&extension) {
        match parser.parse(raw) {
            Ok(value) => return Ok(value),
            Err(e) => {
                let failure = FlowError::CustomParserFailure {
                    extension: extension.clone(),
                    detail: e.to_string(),
                };
                logger.warn(&format!(
                    "{} ({}); using default parser",
                    failure,
                    path.display()
                ));
            }
        }
    }

    parse_default(raw, &extension, path, &custom.csv_delimiter)
}

fn parse_default(raw: &str, extension: &str, path: &Path, delimiter: &str) -> Result<Value> {
    match extension {
        "json" => serde_json::from_str(raw).map_err(|e| FlowError::Parse {
            path: path.to_path_buf(),
            format: "JSON".to_string(),
            detail: e.to_string(),
        }),
        "csv" => Ok(parse_csv(raw, delimiter)),
        _ => Ok(Value::String(raw.to_string())),
    }
}

/// Splits CSV text into an array of objects keyed by the header row.
///
/// No quoting rules: every line is split on `delimiter` and each field is
/// trimmed. Blank lines are skipped, short rows are padded with `""` and
/// surplus fields are dropped.
pub fn parse_csv(raw: &str, delimiter: &str) -> Value {
    let delimiter = if delimiter.is_empty() { "," } else { delimiter };
    let mut lines = raw.lines().filter(|line| !line.trim().is_empty());

    let Some(header) = lines.next() else {
        return Value::Array(Vec::new());
    };
    let columns: Vec<&str> = header.split(delimiter).map(str::trim).collect();

    let rows = lines
        .map(|line| {
            let mut fields = line.split(delimiter).map(str::trim);
            let row: Map<String, Value> = columns
                .iter()
                .map(|column| {
                    let value = fields.next().unwrap_or_default();
                    (column.to_string(), Value::String(value.to_string()))
                })
                .collect();
            Value::Object(row)
        })
        .collect();

    Value::Array(rows)
}
