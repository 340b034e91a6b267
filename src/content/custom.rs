//! Custom Parsers and Formatters
//!
//! A [`CustomConfig`] overrides how files are parsed and formatted. Library
//! users register closures directly; workflows on disk declare scripts in
//! `fileflow.custom.json` (or `.yaml`/`.yml`) next to the workflow file,
//! which run through the [`ScriptSandbox`] like transform steps do.
//!
//! ```json
//! {
//!   "input":   { "parsers": { "xml": "./parsers/xml.js" }, "csvDelimiter": ";" },
//!   "output":  { "formatters": { "default": "./fmt/pretty.js" },
//!                "defaultFormat": "json", "jsonIndent": 4 },
//!   "options": { "transform": { "locale": "de" } }
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{FlowError, Result};
use crate::logging::Logger;
use crate::sandbox::ScriptSandbox;
use crate::workflow::parser::ConfigFormat;

/// File names looked up at the workflow root, in order.
pub const CUSTOM_CONFIG_FILES: &[&str] = &[
    "fileflow.custom.json",
    "fileflow.custom.yaml",
    "fileflow.custom.yml",
];

/// Key of the catch-all formatter.
pub const DEFAULT_FORMATTER_KEY: &str = "default";

/// Default indentation for structured output.
pub const DEFAULT_JSON_INDENT: usize = 2;

/// Error type returned by user-supplied parsers and formatters.
pub type PluginError = Box<dyn std::error::Error + Send + Sync>;

/// Turns raw file text into a content value.
pub trait ContentParser: Send + Sync {
    fn parse(&self, raw: &str) -> std::result::Result<Value, PluginError>;
}

impl<F> ContentParser for F
where
    F: Fn(&str) -> std::result::Result<Value, PluginError> + Send + Sync,
{
    fn parse(&self, raw: &str) -> std::result::Result<Value, PluginError> {
        self(raw)
    }
}

/// Turns a content value into output text.
pub trait ContentFormatter: Send + Sync {
    fn format(&self, value: &Value) -> std::result::Result<String, PluginError>;
}

impl<F> ContentFormatter for F
where
    F: Fn(&Value) -> std::result::Result<String, PluginError> + Send + Sync,
{
    fn format(&self, value: &Value) -> std::result::Result<String, PluginError> {
        self(value)
    }
}

/// Parser and formatter overrides plus codec settings.
#[derive(Clone)]
pub struct CustomConfig {
    parsers: HashMap<String, Arc<dyn ContentParser>>,
    formatters: HashMap<String, Arc<dyn ContentFormatter>>,
    /// Field delimiter for CSV input
    pub csv_delimiter: String,
    /// Formatter key used when the output extension has none
    pub default_format: Option<String>,
    /// Spaces per indentation level for structured output
    pub json_indent: usize,
    /// Defaults merged beneath every transform step's options
    pub transform_options: Map<String, Value>,
}

impl CustomConfig {
    pub fn new() -> Self {
        Self {
            parsers: HashMap::new(),
            formatters: HashMap::new(),
            csv_delimiter: ",".to_string(),
            default_format: None,
            json_indent: DEFAULT_JSON_INDENT,
            transform_options: Map::new(),
        }
    }

    /// Registers a parser for an extension (with or without leading dot).
    pub fn with_parser(mut self, extension: &str, parser: impl ContentParser + 'static) -> Self {
        self.parsers.insert(normalize_key(extension), Arc::new(parser));
        self
    }

    /// Registers a formatter for an extension or for `"default"`.
    pub fn with_formatter(mut self, key: &str, formatter: impl ContentFormatter + 'static) -> Self {
        self.formatters.insert(normalize_key(key), Arc::new(formatter));
        self
    }

    pub fn with_csv_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.csv_delimiter = delimiter.into();
        self
    }

    pub fn with_default_format(mut self, format: impl Into<String>) -> Self {
        self.default_format = Some(normalize_key(&format.into()));
        self
    }

    pub fn with_json_indent(mut self, indent: usize) -> Self {
        self.json_indent = indent;
        self
    }

    pub fn with_transform_options(mut self, options: Map<String, Value>) -> Self {
        self.transform_options = options;
        self
    }

    /// Returns the parser registered for `extension`.
    pub fn parser_for(&self, extension: &str) -> Option<Arc<dyn ContentParser>> {
        self.parsers.get(&normalize_key(extension)).cloned()
    }

    /// Returns the formatter for `extension` and the key it was found under.
    ///
    /// Lookup order: the extension itself, `defaultFormat`, then `"default"`.
    pub fn formatter_for(&self, extension: &str) -> Option<(String, Arc<dyn ContentFormatter>)> {
        let candidates = [
            Some(normalize_key(extension)),
            self.default_format.clone(),
            Some(DEFAULT_FORMATTER_KEY.to_string()),
        ];

        candidates.into_iter().flatten().find_map(|key| {
            self.formatters
                .get(&key)
                .map(|formatter| (key.clone(), Arc::clone(formatter)))
        })
    }

    /// Merges `step_options` over the configured transform defaults.
    pub fn merged_transform_options(&self, step_options: &Map<String, Value>) -> Map<String, Value> {
        let mut merged = self.transform_options.clone();
        for (key, value) in step_options {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Loads the custom config from `root`, if one of
    /// [`CUSTOM_CONFIG_FILES`] exists there.
    pub fn load(
        root: &Path,
        sandbox: &ScriptSandbox,
        logger: Arc<dyn Logger>,
    ) -> Result<Option<Self>> {
        let Some(path) = CUSTOM_CONFIG_FILES
            .iter()
            .map(|name| root.join(name))
            .find(|path| path.is_file())
        else {
            return Ok(None);
        };

        logger.info(&format!("Loading custom config: {}", path.display()));

        let text = fs::read_to_string(&path)
            .map_err(|e| FlowError::io(format!("failed to read '{}'", path.display()), e))?;
        let file: CustomConfigFile = match ConfigFormat::from_path(&path) {
            ConfigFormat::Json => serde_json::from_str(&text).map_err(|e| e.to_string()),
            ConfigFormat::Yaml => serde_yaml::from_str(&text).map_err(|e| e.to_string()),
        }
        .map_err(|detail| FlowError::ConfigParse {
            path: path.clone(),
            detail,
        })?;

        Ok(Some(file.into_config(root, sandbox, logger)))
    }
}

impl Default for CustomConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CustomConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parsers: Vec<_> = self.parsers.keys().collect();
        parsers.sort();
        let mut formatters: Vec<_> = self.formatters.keys().collect();
        formatters.sort();

        f.debug_struct("CustomConfig")
            .field("parsers", &parsers)
            .field("formatters", &formatters)
            .field("csv_delimiter", &self.csv_delimiter)
            .field("default_format", &self.default_format)
            .field("json_indent", &self.json_indent)
            .field("transform_options", &self.transform_options)
            .finish()
    }
}

/// Lowercases and strips a leading dot: `".CSV"` becomes `"csv"`.
pub fn normalize_key(key: &str) -> String {
    key.trim().trim_start_matches('.').to_ascii_lowercase()
}

#[derive(Deserialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
struct CustomConfigFile {
    input: InputSection,
    output: OutputSection,
    options: OptionsSection,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
struct InputSection {
    parsers: HashMap<String, String>,
    csv_delimiter: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default, rename_all = "camelCase")]
struct OutputSection {
    formatters: HashMap<String, String>,
    default_format: Option<String>,
    json_indent: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct OptionsSection {
    transform: Map<String, Value>,
}

impl CustomConfigFile {
    fn into_config(self, root: &Path, sandbox: &ScriptSandbox, logger: Arc<dyn Logger>) -> CustomConfig {
        let mut config = CustomConfig::new().with_transform_options(self.options.transform);

        if let Some(delimiter) = self.input.csv_delimiter.filter(|d| !d.is_empty()) {
            config = config.with_csv_delimiter(delimiter);
        }
        if let Some(format) = self.output.default_format {
            config = config.with_default_format(format);
        }
        if let Some(indent) = self.output.json_indent {
            config = config.with_json_indent(indent);
        }

        for (extension, script) in self.input.parsers {
            let parser = ScriptParser {
                script: root.join(script),
                sandbox: sandbox.clone(),
                logger: Arc::clone(&logger),
            };
            config = config.with_parser(&extension, parser);
        }
        for (key, script) in self.output.formatters {
            let formatter = ScriptFormatter {
                script: root.join(script),
                sandbox: sandbox.clone(),
                logger: Arc::clone(&logger),
            };
            config = config.with_formatter(&key, formatter);
        }

        config
    }
}

/// Parser backed by a sandboxed script receiving the raw text as content.
pub struct ScriptParser {
    pub script: PathBuf,
    pub sandbox: ScriptSandbox,
    pub logger: Arc<dyn Logger>,
}

impl ContentParser for ScriptParser {
    fn parse(&self, raw: &str) -> std::result::Result<Value, PluginError> {
        let value = self.sandbox.execute(
            &self.script,
            &Value::String(raw.to_string()),
            &Value::Object(Map::new()),
            None,
            self.logger.as_ref(),
        )?;
        Ok(value)
    }
}

/// Formatter backed by a sandboxed script. A string result is used
/// verbatim, anything else is JSON-encoded.
pub struct ScriptFormatter {
    pub script: PathBuf,
    pub sandbox: ScriptSandbox,
    pub logger: Arc<dyn Logger>,
}

impl ContentFormatter for ScriptFormatter {
    fn format(&self, value: &Value) -> std::result::Result<String, PluginError> {
        let result = self.sandbox.execute(
            &self.script,
            value,
            &Value::Object(Map::new()),
            None,
            self.logger.as_ref(),
        )?;
        Ok(match result {
            Value::String(text) => text,
            other => other.to_string(),
        })
    }
}
