//! Workflow Data Model
//!
//! Core data structures describing a workflow and its ordered steps.
//!
//! # Example JSON Format
//!
//! ```json
//! {
//!   "name": "normalise-users",
//!   "input_dir": "./input",
//!   "output_dir": "./output",
//!   "steps": [
//!     { "name": "clean", "type": "transform", "function": "./steps/clean.js" },
//!     { "name": "shout", "type": "built-in", "function": "toUpperCase",
//!       "skip_existing": true }
//!   ]
//! }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FlowError;

/// A single step of a workflow.
///
/// The step type is kept as the raw string from the config file so that an
/// unknown type fails the file being processed rather than the whole load.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorkflowStep {
    /// Human readable label (not required to be unique)
    pub name: String,

    /// Step type: `transform`, `built-in` or `filter`
    #[serde(rename = "type")]
    pub step_type: String,

    /// Script path for transforms, registered name for built-ins
    #[serde(default)]
    pub function: String,

    /// Opaque options passed verbatim to the step
    #[serde(default)]
    pub options: Map<String, Value>,

    /// Skip the file when its output already exists
    #[serde(default)]
    pub skip_existing: bool,

    /// Deadline for transform scripts, in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl WorkflowStep {
    /// Creates a step with empty options.
    ///
    /// ```
    /// use fileflow::workflow::WorkflowStep;
    ///
    /// let step = WorkflowStep::new("shout", "built-in", "toUpperCase").skip_existing(true);
    /// assert!(step.skip_existing);
    /// ```
    pub fn new(
        name: impl Into<String>,
        step_type: impl Into<String>,
        function: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into().trim().to_string(),
            step_type: step_type.into().trim().to_string(),
            function: function.into().trim().to_string(),
            options: Map::new(),
            skip_existing: false,
            timeout_ms: None,
        }
    }

    /// Adds a single option.
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Sets the skip-existing flag.
    pub fn skip_existing(mut self, skip: bool) -> Self {
        self.skip_existing = skip;
        self
    }

    /// Sets the script deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Parses the declared step type.
    pub fn kind(&self) -> Result<StepKind, FlowError> {
        self.step_type.parse()
    }

    /// Returns the configured deadline, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Label used in log lines and errors.
    pub fn label(&self) -> String {
        format!("step '{}' ({})", self.name, self.step_type)
    }
}

/// The three kinds of step the engine knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// User script executed in the sandbox
    Transform,
    /// Function from the built-in library
    BuiltIn,
    /// Keeps or drops records, never calls user code
    Filter,
}

impl FromStr for StepKind {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transform" => Ok(StepKind::Transform),
            "built-in" => Ok(StepKind::BuiltIn),
            "filter" => Ok(StepKind::Filter),
            other => Err(FlowError::UnknownStepType(other.to_string())),
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::Transform => write!(f, "transform"),
            StepKind::BuiltIn => write!(f, "built-in"),
            StepKind::Filter => write!(f, "filter"),
        }
    }
}

/// How an output file name is derived from its input file name.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputNaming {
    /// Same file name and extension as the input
    #[default]
    Preserve,
    /// Input stem with the extension forced to `.json`
    Json,
}

impl OutputNaming {
    /// Returns the output path for `input` inside `output_dir`.
    pub fn output_path(&self, input: &Path, output_dir: &Path) -> PathBuf {
        let file_name = input
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();

        match self {
            OutputNaming::Preserve => output_dir.join(file_name),
            OutputNaming::Json => {
                let mut name = input
                    .file_stem()
                    .map(|stem| stem.to_os_string())
                    .unwrap_or(file_name);
                name.push(".json");
                output_dir.join(name)
            }
        }
    }
}

/// A complete workflow definition.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WorkflowConfig {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Directory holding the input files, relative to the config file
    pub input_dir: String,

    /// Directory receiving the output files, relative to the config file
    pub output_dir: String,

    /// Steps in execution order
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,

    #[serde(default)]
    pub output_naming: OutputNaming,
}

impl WorkflowConfig {
    /// Creates a workflow with no steps.
    pub fn new(
        name: impl Into<String>,
        input_dir: impl Into<String>,
        output_dir: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            version: None,
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            steps: Vec::new(),
            output_naming: OutputNaming::default(),
        }
    }

    /// Appends a step.
    pub fn with_step(mut self, step: WorkflowStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Resolves the input directory against the workflow root.
    pub fn resolve_input_dir(&self, root: &Path) -> PathBuf {
        resolve_against(root, &self.input_dir)
    }

    /// Resolves the output directory against the workflow root.
    pub fn resolve_output_dir(&self, root: &Path) -> PathBuf {
        resolve_against(root, &self.output_dir)
    }

    /// Returns the number of steps in the workflow.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the workflow has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

fn resolve_against(root: &Path, dir: &str) -> PathBuf {
    let path = Path::new(dir);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_step_creation() {
        let step = WorkflowStep::new(" upper ", "built-in", "toUpperCase")
            .with_option("locale", json!("en"))
            .skip_existing(true);

        assert_eq!(step.name, "upper");
        assert_eq!(step.kind().unwrap(), StepKind::BuiltIn);
        assert!(step.skip_existing);
        assert_eq!(step.options["locale"], json!("en"));
    }

    #[test]
    fn test_step_kind_parsing() {
        assert_eq!("transform".parse::<StepKind>().unwrap(), StepKind::Transform);
        assert_eq!("filter".parse::<StepKind>().unwrap(), StepKind::Filter);

        let err = "map".parse::<StepKind>().unwrap_err();
        assert!(matches!(err, FlowError::UnknownStepType(ref t) if t == "map"));
    }

    #[test]
    fn test_step_kind_display_roundtrip() {
        for kind in [StepKind::Transform, StepKind::BuiltIn, StepKind::Filter] {
            assert_eq!(kind.to_string().parse::<StepKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_step_deserialize_defaults() {
        let step: WorkflowStep =
            serde_json::from_value(json!({ "name": "f", "type": "filter" })).unwrap();

        assert_eq!(step.function, "");
        assert!(step.options.is_empty());
        assert!(!step.skip_existing);
        assert!(step.timeout().is_none());
    }

    #[test]
    fn test_step_timeout() {
        let step = WorkflowStep::new("t", "transform", "a.js").with_timeout(Duration::from_secs(2));
        assert_eq!(step.timeout_ms, Some(2000));
        assert_eq!(step.timeout(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_output_naming_preserve() {
        let out = OutputNaming::Preserve.output_path(Path::new("/in/users.csv"), Path::new("/out"));
        assert_eq!(out, PathBuf::from("/out/users.csv"));
    }

    #[test]
    fn test_output_naming_json() {
        let out = OutputNaming::Json.output_path(Path::new("/in/users.csv"), Path::new("/out"));
        assert_eq!(out, PathBuf::from("/out/users.json"));

        let out = OutputNaming::Json.output_path(Path::new("/in/README"), Path::new("/out"));
        assert_eq!(out, PathBuf::from("/out/README.json"));

        let out = OutputNaming::Json.output_path(Path::new("/in/a.b.csv"), Path::new("/out"));
        assert_eq!(out, PathBuf::from("/out/a.b.json"));
    }

    #[test]
    fn test_output_naming_deserialize() {
        let naming: OutputNaming = serde_json::from_value(json!("json")).unwrap();
        assert_eq!(naming, OutputNaming::Json);
        assert_eq!(OutputNaming::default(), OutputNaming::Preserve);
    }

    #[test]
    fn test_resolve_dirs() {
        let workflow = WorkflowConfig::new("wf", "input", "/abs/output");
        let root = Path::new("/projects/demo");

        assert_eq!(workflow.resolve_input_dir(root), PathBuf::from("/projects/demo/input"));
        assert_eq!(workflow.resolve_output_dir(root), PathBuf::from("/abs/output"));
    }

    #[test]
    fn test_workflow_is_empty() {
        let workflow = WorkflowConfig::new("wf", "in", "out");
        assert!(workflow.is_empty());

        let workflow = workflow.with_step(WorkflowStep::new("f", "filter", ""));
        assert!(!workflow.is_empty());
        assert_eq!(workflow.len(), 1);
    }
}
