//! Individual Step Execution
//!
//! Runs one step against the current content value:
//! - `transform`: user script executed in the sandbox
//! - `built-in`: function from the in-process library
//! - `filter`: record selection driven by `options.where`

use std::path::Path;

use log::debug;
use serde_json::{Map, Value};

use crate::builtins;
use crate::error::Result;
use crate::workflow::{StepKind, WorkflowStep};

use super::context::RunContext;

/// Executes a single workflow step and returns the new content.
///
/// # Arguments
///
/// * `step` - The step definition
/// * `content` - Output of the previous step (or the parsed file)
/// * `file` - Input file being processed, for log lines
/// * `ctx` - Shared run state
///
/// # Errors
///
/// `UnknownStepType` for an unrecognised `type`, `UnknownBuiltinFunction`
/// for an unregistered built-in, and any sandbox error for transforms.
pub fn execute_step(step: &WorkflowStep, content: Value, file: &Path, ctx: &RunContext) -> Result<Value> {
    let kind = step.kind()?;
    debug!("Running {} on {}", step.label(), file.display());

    match kind {
        StepKind::Transform => run_transform(step, content, ctx),
        StepKind::BuiltIn => builtins::apply(&step.function, content, &step.options),
        StepKind::Filter => Ok(apply_filter(content, &step.options)),
    }
}

fn run_transform(step: &WorkflowStep, content: Value, ctx: &RunContext) -> Result<Value> {
    let script = ctx.resolve_script(&step.function);
    let options = Value::Object(ctx.custom.merged_transform_options(&step.options));
    let deadline = step.timeout().or(ctx.policy.default_timeout);

    ctx.sandbox
        .execute(&script, &content, &options, deadline, ctx.logger)
}

/// Keeps array elements matching every `options.where` field.
///
/// Without a `where` object, or for non-array content, the content passes
/// through unchanged.
pub fn apply_filter(content: Value, options: &Map<String, Value>) -> Value {
    let Some(conditions) = options.get("where").and_then(Value::as_object) else {
        return content;
    };

    match content {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|item| matches_all(item, conditions))
                .collect(),
        ),
        other => other,
    }
}

fn matches_all(item: &Value, conditions: &Map<String, Value>) -> bool {
    match item.as_object() {
        Some(fields) => conditions
            .iter()
            .all(|(key, expected)| fields.get(key) == Some(expected)),
        None => false,
    }
}
