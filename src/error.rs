//! Error Types
//!
//! A single error enum covers every failure the engine can report, from
//! config loading through script execution to writing output files.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, FlowError>;

/// Errors raised while loading or running a workflow.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("workflow config not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("failed to parse workflow config '{}': {detail}", path.display())]
    ConfigParse { path: PathBuf, detail: String },

    #[error("input directory does not exist: {}", path.display())]
    DirectoryMissing { path: PathBuf },

    #[error("failed to parse '{}' as {format}: {detail}", path.display())]
    Parse {
        path: PathBuf,
        format: String,
        detail: String,
    },

    #[error("custom parser for '.{extension}' failed: {detail}")]
    CustomParserFailure { extension: String, detail: String },

    #[error("custom formatter for '{key}' failed: {detail}")]
    CustomFormatterFailure { key: String, detail: String },

    #[error("no transform function found in '{}' (tried: {tried})", script.display())]
    NoTransformFunctionFound { script: PathBuf, tried: String },

    #[error("transform script not found: {}", script.display())]
    ScriptNotFound { script: PathBuf },

    #[error("script '{}' failed{}: {detail}", script.display(), exit_suffix(*code))]
    ScriptExecution {
        script: PathBuf,
        code: Option<i32>,
        detail: String,
    },

    #[error("script '{}' timed out after {:?}", script.display(), timeout)]
    ScriptTimeout { script: PathBuf, timeout: Duration },

    #[error("script '{}' returned invalid JSON: {detail}", script.display())]
    ResultParse { script: PathBuf, detail: String },

    #[error("unknown step type '{0}' (expected transform, built-in or filter)")]
    UnknownStepType(String),

    #[error("unknown built-in function '{0}'")]
    UnknownBuiltinFunction(String),

    #[error("failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("processing '{}' failed at {step}: {source}", file.display())]
    FileFailed {
        file: PathBuf,
        step: String,
        #[source]
        source: Box<FlowError>,
    },
}

impl FlowError {
    /// Wraps an I/O error with a short description of what was attempted.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

fn exit_suffix(code: Option<i32>) -> String {
    match code {
        Some(code) => format!(" with exit code {}", code),
        None => " (terminated by signal)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_execution_message_includes_code() {
        let err = FlowError::ScriptExecution {
            script: PathBuf::from("steps/clean.js"),
            code: Some(2),
            detail: "boom".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("exit code 2"));
        assert!(message.contains("boom"));
    }

    #[test]
    fn test_script_execution_message_signal() {
        let err = FlowError::ScriptExecution {
            script: PathBuf::from("a.js"),
            code: None,
            detail: String::new(),
        };
        assert!(err.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_file_failed_keeps_source() {
        let err = FlowError::FileFailed {
            file: PathBuf::from("in/a.json"),
            step: "step 'upper'".to_string(),
            source: Box::new(FlowError::UnknownBuiltinFunction("shout".to_string())),
        };
        assert!(err.to_string().contains("shout"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
