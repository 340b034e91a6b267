//! Script Sandbox
//!
//! Executes user-authored transform scripts in a separate Node.js process so
//! that a crashing, hanging or noisy script cannot take the run down with it.
//!
//! One call to [`ScriptSandbox::execute`]:
//! 1. creates a private, uniquely named workspace,
//! 2. writes the content and options payloads and a generated harness,
//! 3. runs the harness and streams its output (see [`process`]),
//! 4. maps the outcome to a value or a [`FlowError`],
//! 5. removes the workspace whatever happened.
//!
//! # Architecture
//!
//! - [`harness`]: loader detection, entry-point strategies, harness source
//! - [`process`]: child process supervision and output routing

pub mod harness;
pub mod process;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use log::debug;
use serde_json::Value;
use tempfile::TempDir;

use crate::environment::NODE_PATH;
use crate::error::{FlowError, Result};
use crate::logging::Logger;

use harness::{
    render_harness, strategy_names, LoaderKind, CONTENT_FILE, HARNESS_FILE, NO_ENTRY_EXIT_CODE,
    NO_ENTRY_MARKER, OPTIONS_FILE,
};
use process::{run_supervised, Exit, HarnessOutput};

/// Prefix of every workspace directory name.
const WORKSPACE_PREFIX: &str = "fileflow-sandbox-";

/// Runs transform scripts out-of-process.
#[derive(Debug, Clone)]
pub struct ScriptSandbox {
    runtime: PathBuf,
    default_timeout: Option<Duration>,
}

impl ScriptSandbox {
    /// Creates a sandbox using the resolved Node.js binary and no deadline.
    pub fn new() -> Self {
        Self {
            runtime: NODE_PATH.clone(),
            default_timeout: None,
        }
    }

    /// Uses a specific runtime binary.
    pub fn with_runtime(mut self, runtime: impl Into<PathBuf>) -> Self {
        self.runtime = runtime.into();
        self
    }

    /// Deadline applied when a call does not pass its own.
    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout
    }

    /// Executes `script` with `(content, options)` and returns its result.
    ///
    /// `deadline` overrides the sandbox default; when it expires the process
    /// is killed and [`FlowError::ScriptTimeout`] is returned.
    pub fn execute(
        &self,
        script: &Path,
        content: &Value,
        options: &Value,
        deadline: Option<Duration>,
        logger: &dyn Logger,
    ) -> Result<Value> {
        if !script.is_file() {
            return Err(FlowError::ScriptNotFound {
                script: script.to_path_buf(),
            });
        }

        let script = script
            .canonicalize()
            .map_err(|e| FlowError::io(format!("failed to resolve '{}'", script.display()), e))?;
        let source = fs::read_to_string(&script).unwrap_or_default();
        let loader = LoaderKind::detect(&script, &source);
        let deadline = deadline.or(self.default_timeout);

        debug!(
            "Executing {} ({:?}, deadline {:?})",
            script.display(),
            loader,
            deadline
        );

        let workspace = Workspace::create()?;
        let result = self.execute_in(&workspace, &script, loader, content, options, deadline, logger);
        workspace.remove();
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn execute_in(
        &self,
        workspace: &Workspace,
        script: &Path,
        loader: LoaderKind,
        content: &Value,
        options: &Value,
        deadline: Option<Duration>,
        logger: &dyn Logger,
    ) -> Result<Value> {
        workspace.write_json(CONTENT_FILE, content)?;
        workspace.write_json(OPTIONS_FILE, options)?;

        let harness_path = workspace.path().join(HARNESS_FILE);
        let harness = render_harness(script, workspace.path(), loader);
        fs::write(&harness_path, harness).map_err(|source| FlowError::Write {
            path: harness_path.clone(),
            source,
        })?;

        let mut command = Command::new(&self.runtime);
        command.arg(&harness_path);
        if let Some(dir) = script.parent() {
            command.current_dir(dir);
        }

        let label = script
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| script.display().to_string());

        let output = run_supervised(command, deadline, &label, logger).map_err(|e| {
            FlowError::ScriptExecution {
                script: script.to_path_buf(),
                code: None,
                detail: format!("could not launch '{}': {}", self.runtime.display(), e),
            }
        })?;

        interpret(script, output, deadline, logger)
    }
}

impl Default for ScriptSandbox {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a finished harness run to the step result.
fn interpret(
    script: &Path,
    output: HarnessOutput,
    deadline: Option<Duration>,
    logger: &dyn Logger,
) -> Result<Value> {
    let HarnessOutput {
        exit,
        stdout,
        detail,
    } = output;

    match exit {
        Exit::TimedOut => Err(FlowError::ScriptTimeout {
            script: script.to_path_buf(),
            timeout: deadline.unwrap_or_default(),
        }),
        Exit::Code(Some(0)) => {
            for line in &detail {
                logger.debug(&format!("[{}] stderr: {}", script.display(), line));
            }
            let payload = stdout.trim();
            if payload.is_empty() {
                return Err(FlowError::ResultParse {
                    script: script.to_path_buf(),
                    detail: "script produced no output".to_string(),
                });
            }
            serde_json::from_str(payload).map_err(|e| FlowError::ResultParse {
                script: script.to_path_buf(),
                detail: e.to_string(),
            })
        }
        Exit::Code(Some(NO_ENTRY_EXIT_CODE))
            if detail.iter().any(|line| line.starts_with(NO_ENTRY_MARKER)) =>
        {
            Err(FlowError::NoTransformFunctionFound {
                script: script.to_path_buf(),
                tried: strategy_names(),
            })
        }
        Exit::Code(code) => {
            let detail = detail.join("\n");
            let detail = if detail.trim().is_empty() {
                "no diagnostic output".to_string()
            } else {
                detail.trim().to_string()
            };
            Err(FlowError::ScriptExecution {
                script: script.to_path_buf(),
                code,
                detail,
            })
        }
    }
}

/// Private per-call directory holding payloads and the harness.
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir()
            .map_err(|e| FlowError::io("failed to create sandbox workspace", e))?;
        Ok(Self { dir })
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write_json(&self, name: &str, value: &Value) -> Result<()> {
        let path = self.path().join(name);
        let text = serde_json::to_string(value)
            .map_err(|e| FlowError::io("failed to serialise payload", e.into()))?;
        fs::write(&path, text).map_err(|source| FlowError::Write { path, source })
    }

    /// Deletes the workspace. Failures are logged and otherwise ignored.
    fn remove(self) {
        let path = self.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            debug!("Failed to remove sandbox workspace {}: {}", path.display(), e);
        }
    }
}
