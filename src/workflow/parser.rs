//! Workflow Parser
//!
//! Loads workflow definitions from disk. JSON is the native format; files
//! ending in `.yaml` or `.yml` are read as YAML with the same schema.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;

use super::model::WorkflowConfig;
use super::validator::validate_workflow;
use crate::error::{FlowError, Result};
use crate::logging::Logger;

/// Serialisation format of a workflow file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    /// Picks the format for a path; anything that is not YAML is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            _ => ConfigFormat::Json,
        }
    }
}

/// Parses workflow text in the given format without touching the disk.
pub fn parse_workflow(text: &str, format: ConfigFormat, path: &Path) -> Result<WorkflowConfig> {
    let parsed = match format {
        ConfigFormat::Json => serde_json::from_str(text).map_err(|e| e.to_string()),
        ConfigFormat::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
    };

    parsed.map_err(|detail| FlowError::ConfigParse {
        path: path.to_path_buf(),
        detail,
    })
}

/// Loads and validates a workflow file.
///
/// Validation warnings are reported through `logger`; validation errors
/// are returned as [`FlowError::ConfigParse`].
///
/// # Example
///
/// ```rust,no_run
/// use fileflow::logging::FacadeLogger;
/// use fileflow::workflow::load_workflow;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let workflow = load_workflow("workflow.json", &FacadeLogger)?;
///     println!("Loaded {} steps", workflow.steps.len());
///     Ok(())
/// }
/// ```
pub fn load_workflow(path: impl AsRef<Path>, logger: &dyn Logger) -> Result<WorkflowConfig> {
    let path = path.as_ref();
    logger.info(&format!("Loading workflow from: {}", path.display()));

    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => FlowError::ConfigNotFound {
            path: path.to_path_buf(),
        },
        _ => FlowError::io(format!("failed to read '{}'", path.display()), e),
    })?;

    debug!("Workflow content loaded ({} bytes)", text.len());

    let workflow = parse_workflow(&text, ConfigFormat::from_path(path), path)?;

    let warnings = validate_workflow(&workflow).map_err(|e| FlowError::ConfigParse {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    for warning in warnings {
        logger.warn(&warning.to_string());
    }

    logger.info(&format!(
        "Workflow '{}' loaded: {} steps",
        workflow.name,
        workflow.steps.len()
    ));

    Ok(workflow)
}

/// Returns the directory relative paths in a workflow file resolve against.
///
/// The path is made absolute using the current directory when needed.
pub fn workflow_root(config_path: &Path) -> Result<PathBuf> {
    let absolute = if config_path.is_absolute() {
        config_path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| FlowError::io("failed to read current directory", e))?
            .join(config_path)
    };

    Ok(absolute
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::CaptureLogger;
    use tempfile::tempdir;

    #[test]
    fn test_config_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("wf.yaml")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("wf.YML")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("wf.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("workflow")), ConfigFormat::Json);
    }

    #[test]
    fn test_load_workflow_file_not_found() {
        let logger = CaptureLogger::new();
        let result = load_workflow("/nonexistent/path/workflow.json", &logger);
        assert!(matches!(result, Err(FlowError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_load_workflow_valid_json() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("workflow.json");
        std::fs::write(
            &path,
            r#"{
                "name": "demo",
                "description": "uppercase everything",
                "version": "1.0.0",
                "input_dir": "input",
                "output_dir": "output",
                "steps": [
                    { "name": "shout", "type": "built-in", "function": "toUpperCase",
                      "skip_existing": true }
                ]
            }"#,
        )
        .unwrap();

        let logger = CaptureLogger::new();
        let workflow = load_workflow(&path, &logger).unwrap();

        assert_eq!(workflow.name, "demo");
        assert_eq!(workflow.version.as_deref(), Some("1.0.0"));
        assert_eq!(workflow.steps.len(), 1);
        assert!(workflow.steps[0].skip_existing);
        assert!(logger.contains("1 steps"));
    }

    #[test]
    fn test_load_workflow_valid_yaml() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("workflow.yaml");
        std::fs::write(
            &path,
            r#"
name: demo
input_dir: input
output_dir: output
output_naming: json
steps:
  - name: greet
    type: built-in
    function: template
    options:
      name: World
"#,
        )
        .unwrap();

        let workflow = load_workflow(&path, &CaptureLogger::new()).unwrap();
        assert_eq!(workflow.steps[0].options["name"], "World");
        assert_eq!(workflow.output_naming, crate::workflow::OutputNaming::Json);
    }

    #[test]
    fn test_load_workflow_invalid_json() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("bad.json");
        std::fs::write(&path, "{ \"name\": ").unwrap();

        let result = load_workflow(&path, &CaptureLogger::new());
        assert!(matches!(result, Err(FlowError::ConfigParse { .. })));
    }

    #[test]
    fn test_load_workflow_missing_dirs_is_parse_error() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("wf.json");
        std::fs::write(&path, r#"{"name":"x","input_dir":"","output_dir":"out"}"#).unwrap();

        let err = load_workflow(&path, &CaptureLogger::new()).unwrap_err();
        assert!(err.to_string().contains("input_dir"));
    }

    #[test]
    fn test_load_workflow_logs_warnings() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("wf.json");
        std::fs::write(
            &path,
            r#"{"name":"x","input_dir":"in","output_dir":"out",
                "steps":[{"name":"odd","type":"reduce","function":"sum"}]}"#,
        )
        .unwrap();

        let logger = CaptureLogger::new();
        load_workflow(&path, &logger).unwrap();
        assert!(!logger.messages_at(log::Level::Warn).is_empty());
    }

    #[test]
    fn test_workflow_root() {
        let root = workflow_root(Path::new("/projects/demo/workflow.json")).unwrap();
        assert_eq!(root, PathBuf::from("/projects/demo"));

        let relative = workflow_root(Path::new("workflow.json")).unwrap();
        assert!(relative.is_absolute());
    }
}
