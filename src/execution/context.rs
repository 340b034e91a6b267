//! Run Policy and Context
//!
//! Everything a step needs besides its own definition, fixed for the
//! duration of a run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::content::CustomConfig;
use crate::logging::Logger;
use crate::sandbox::ScriptSandbox;
use crate::workflow::OutputNaming;

/// Switches chosen by the caller for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunPolicy {
    /// Process files even when a skip-existing step finds their output
    pub overwrite_existing: bool,
    /// Log per-file failures and move on instead of aborting the run
    pub continue_on_error: bool,
    /// Deadline for transform steps that do not set their own
    pub default_timeout: Option<Duration>,
}

impl RunPolicy {
    /// Policy for the `--force` flag, which enables both switches.
    ///
    /// ```
    /// use fileflow::execution::RunPolicy;
    ///
    /// let policy = RunPolicy::from_force(true);
    /// assert!(policy.overwrite_existing && policy.continue_on_error);
    /// ```
    pub fn from_force(force: bool) -> Self {
        Self {
            overwrite_existing: force,
            continue_on_error: force,
            default_timeout: None,
        }
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite_existing = overwrite;
        self
    }

    pub fn with_continue_on_error(mut self, keep_going: bool) -> Self {
        self.continue_on_error = keep_going;
        self
    }

    pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }
}

/// Shared, read-only state of a run.
pub struct RunContext<'a> {
    /// Directory of the workflow file; scripts resolve against it
    pub root: &'a Path,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub naming: OutputNaming,
    pub policy: RunPolicy,
    pub custom: &'a CustomConfig,
    pub sandbox: &'a ScriptSandbox,
    pub logger: &'a dyn Logger,
}

impl RunContext<'_> {
    /// Output path for an input file under the run's naming policy.
    pub fn output_path(&self, input: &Path) -> PathBuf {
        self.naming.output_path(input, &self.output_dir)
    }

    /// Resolves a script path from the workflow against the root.
    pub fn resolve_script(&self, function: &str) -> PathBuf {
        let path = Path::new(function);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}
