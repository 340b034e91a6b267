//! Workflow Execution Engine
//!
//! Orchestrates a run: resolves directories against the workflow root,
//! loads the custom codec config, discovers the input files and pushes
//! each one through every step before writing its output.
//!
//! Files are processed one at a time in file-name order. Within a file the
//! content value produced by each step is the input of the next.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::content::{format_value, parse_file, CustomConfig};
use crate::discovery::discover_files;
use crate::error::{FlowError, Result};
use crate::logging::{FacadeLogger, Logger};
use crate::monitoring::{ExecutionTimeline, FileState};
use crate::sandbox::ScriptSandbox;
use crate::workflow::{load_workflow, workflow_root, WorkflowConfig, WorkflowStep};

use super::context::{RunContext, RunPolicy};
use super::step::execute_step;
use super::summary::{FileOutcome, RunSummary};

/// Workflow execution engine.
///
/// # Example
///
/// ```rust,no_run
/// use fileflow::execution::{Engine, RunPolicy};
/// use fileflow::logging::FacadeLogger;
/// use fileflow::workflow::load_workflow;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let workflow = load_workflow("project/workflow.json", &FacadeLogger)?;
///     let mut engine = Engine::new(workflow, "project");
///     engine.set_policy(RunPolicy::from_force(true));
///
///     let summary = engine.run()?;
///     println!("{}", summary.report());
///     Ok(())
/// }
/// ```
pub struct Engine {
    workflow: WorkflowConfig,
    root: PathBuf,
    policy: RunPolicy,
    custom: Option<CustomConfig>,
    sandbox: ScriptSandbox,
    logger: Arc<dyn Logger>,
}

impl Engine {
    /// Creates an engine for `workflow`, resolving paths against `root`.
    pub fn new(workflow: WorkflowConfig, root: impl Into<PathBuf>) -> Self {
        Self {
            workflow,
            root: root.into(),
            policy: RunPolicy::default(),
            custom: None,
            sandbox: ScriptSandbox::new(),
            logger: Arc::new(FacadeLogger),
        }
    }

    /// Sets the run policy.
    pub fn set_policy(&mut self, policy: RunPolicy) {
        self.policy = policy;
    }

    /// Uses `custom` instead of loading a custom config from the root.
    pub fn set_custom_config(&mut self, custom: CustomConfig) {
        self.custom = Some(custom);
    }

    /// Sets the sandbox used for transform steps.
    pub fn set_sandbox(&mut self, sandbox: ScriptSandbox) {
        self.sandbox = sandbox;
    }

    /// Sets the logger every component of the run reports to.
    pub fn set_logger(&mut self, logger: Arc<dyn Logger>) {
        self.logger = logger;
    }

    /// Executes the workflow over every discovered input file.
    ///
    /// # Returns
    ///
    /// * `Ok(summary)` - All files were handled; with `continue_on_error`
    ///   the summary may still list failed files
    /// * `Err(FlowError::FileFailed)` - A file failed and the policy aborts
    pub fn run(&self) -> Result<RunSummary> {
        let start_time = Instant::now();
        let logger = self.logger.as_ref();
        let mut summary = RunSummary::new(&self.workflow.name);

        let input_dir = self.workflow.resolve_input_dir(&self.root);
        let output_dir = self.workflow.resolve_output_dir(&self.root);
        let sandbox = self
            .sandbox
            .clone()
            .with_default_timeout(self.sandbox.default_timeout().or(self.policy.default_timeout));
        let custom = self.resolve_custom_config(&sandbox);

        logger.info(&format!(
            "Running workflow '{}' ({} steps): {} -> {}",
            self.workflow.name,
            self.workflow.len(),
            input_dir.display(),
            output_dir.display()
        ));

        let files = discover_files(&input_dir, logger)?;
        if files.is_empty() {
            logger.warn(&format!("No input files found in {}", input_dir.display()));
        }

        let ctx = RunContext {
            root: &self.root,
            input_dir,
            output_dir,
            naming: self.workflow.output_naming,
            policy: self.policy,
            custom: &custom,
            sandbox: &sandbox,
            logger,
        };

        for file in files {
            let name = file_label(&file);
            summary.timeline.begin(name.clone());

            match process_file(&self.workflow.steps, &file, &ctx, &mut summary.timeline) {
                Ok(outcome) => summary.record(file, outcome),
                Err(e) => {
                    summary.timeline.record(&name, FileState::Failed);
                    logger.error(&e.to_string());

                    if !ctx.policy.continue_on_error {
                        return Err(e);
                    }
                    summary.record(file, FileOutcome::Failed(e.to_string()));
                }
            }
        }

        summary.elapsed = start_time.elapsed();
        logger.info(&format!(
            "Processed {} file(s): {} written, {} skipped, {} failed",
            summary.processed(),
            summary.written(),
            summary.skipped(),
            summary.failures().len()
        ));

        Ok(summary)
    }

    /// Explicit config first, then the file at the root. A broken file is
    /// reported and replaced by the defaults. Script-backed parsers and
    /// formatters run in `sandbox`, so they share the run's deadline.
    fn resolve_custom_config(&self, sandbox: &ScriptSandbox) -> CustomConfig {
        if let Some(custom) = &self.custom {
            return custom.clone();
        }

        match CustomConfig::load(&self.root, sandbox, Arc::clone(&self.logger)) {
            Ok(Some(custom)) => custom,
            Ok(None) => CustomConfig::default(),
            Err(e) => {
                self.logger
                    .warn(&format!("Ignoring custom config: {}", e));
                CustomConfig::default()
            }
        }
    }
}

/// Runs the workflow at `config_path`; `force` enables both policy switches.
pub fn run(config_path: impl AsRef<Path>, force: bool) -> Result<RunSummary> {
    run_with_policy(config_path, RunPolicy::from_force(force), Arc::new(FacadeLogger))
}

/// Loads the workflow at `config_path` and runs it under `policy`.
pub fn run_with_policy(
    config_path: impl AsRef<Path>,
    policy: RunPolicy,
    logger: Arc<dyn Logger>,
) -> Result<RunSummary> {
    let config_path = config_path.as_ref();
    let workflow = load_workflow(config_path, logger.as_ref())?;
    let root = workflow_root(config_path)?;

    let mut engine = Engine::new(workflow, root);
    engine.set_policy(policy);
    engine.set_logger(logger);
    engine.run()
}

/// Pushes one file through every step and writes the result.
fn process_file(
    steps: &[WorkflowStep],
    file: &Path,
    ctx: &RunContext,
    timeline: &mut ExecutionTimeline,
) -> Result<FileOutcome> {
    let name = file_label(file);
    let output_path = ctx.output_path(file);
    let mut content: Option<Value> = None;

    for (index, step) in steps.iter().enumerate() {
        if step.skip_existing && !ctx.policy.overwrite_existing && output_path.exists() {
            ctx.logger.info(&format!(
                "Skipping {}: output exists ({})",
                name,
                output_path.display()
            ));
            timeline.record(&name, FileState::Skipped);
            return Ok(FileOutcome::Skipped(output_path));
        }

        let current = match content.take() {
            Some(value) => value,
            None => parse_input(file, ctx, timeline)?,
        };

        timeline.record(&name, FileState::Stepping(index));
        let next = execute_step(step, current, file, ctx)
            .map_err(|e| file_failed(file, step.label(), e))?;
        content = Some(next);
    }

    let value = match content {
        Some(value) => value,
        None => parse_input(file, ctx, timeline)?,
    };

    timeline.record(&name, FileState::Formatting);
    let text = format_value(&value, &output_path, ctx.custom, ctx.logger);
    write_output(&output_path, &ctx.output_dir, &text)
        .map_err(|e| file_failed(file, "writing output", e))?;

    timeline.record(&name, FileState::Written);
    ctx.logger.info(&format!("Wrote {}", output_path.display()));

    Ok(FileOutcome::Written(output_path))
}

fn parse_input(file: &Path, ctx: &RunContext, timeline: &mut ExecutionTimeline) -> Result<Value> {
    timeline.record(&file_label(file), FileState::Parsing);
    parse_file(file, ctx.custom, ctx.logger).map_err(|e| file_failed(file, "parsing", e))
}

fn write_output(path: &Path, output_dir: &Path, text: &str) -> Result<()> {
    fs::create_dir_all(output_dir).map_err(|e| {
        FlowError::io(format!("failed to create '{}'", output_dir.display()), e)
    })?;
    fs::write(path, text).map_err(|source| FlowError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn file_failed(file: &Path, step: impl Into<String>, source: FlowError) -> FlowError {
    FlowError::FileFailed {
        file: file.to_path_buf(),
        step: step.into(),
        source: Box::new(source),
    }
}

fn file_label(file: &Path) -> String {
    file.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string())
}
