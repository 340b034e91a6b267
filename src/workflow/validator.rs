//! Workflow Validation
//!
//! Load-time checks for a workflow definition. Only a missing directory
//! setting is fatal; everything else is reported as a warning because an
//! unknown step type or built-in name fails the individual file when it is
//! reached, not the whole load.

use std::fmt;

use super::model::{StepKind, WorkflowConfig, WorkflowStep};
use crate::builtins;

/// Problems that make a workflow unusable.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyInputDir,
    EmptyOutputDir,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInputDir => write!(f, "Workflow has no input_dir"),
            Self::EmptyOutputDir => write!(f, "Workflow has no output_dir"),
        }
    }
}

/// Suspicious but non-fatal findings.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationWarning {
    NoSteps,
    UnknownStepType { step: String, step_type: String },
    UnknownBuiltin { step: String, function: String },
    MissingScript { step: String },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSteps => write!(f, "Workflow has no steps; files will be copied through the codec"),
            Self::UnknownStepType { step, step_type } => {
                write!(f, "Step '{}' has unknown type '{}'", step, step_type)
            }
            Self::UnknownBuiltin { step, function } => {
                write!(f, "Step '{}' uses unknown built-in '{}'", step, function)
            }
            Self::MissingScript { step } => {
                write!(f, "Transform step '{}' has no function path", step)
            }
        }
    }
}

fn validate_step(step: &WorkflowStep) -> Option<ValidationWarning> {
    match step.kind() {
        Err(_) => Some(ValidationWarning::UnknownStepType {
            step: step.name.clone(),
            step_type: step.step_type.clone(),
        }),
        Ok(StepKind::BuiltIn) if !builtins::is_builtin(&step.function) => {
            Some(ValidationWarning::UnknownBuiltin {
                step: step.name.clone(),
                function: step.function.clone(),
            })
        }
        Ok(StepKind::Transform) if step.function.trim().is_empty() => {
            Some(ValidationWarning::MissingScript {
                step: step.name.clone(),
            })
        }
        Ok(_) => None,
    }
}

/// Validates a workflow, returning the warnings worth reporting.
pub fn validate_workflow(
    workflow: &WorkflowConfig,
) -> Result<Vec<ValidationWarning>, ValidationError> {
    if workflow.input_dir.trim().is_empty() {
        return Err(ValidationError::EmptyInputDir);
    }
    if workflow.output_dir.trim().is_empty() {
        return Err(ValidationError::EmptyOutputDir);
    }

    let mut warnings = Vec::new();
    if workflow.steps.is_empty() {
        warnings.push(ValidationWarning::NoSteps);
    }
    warnings.extend(workflow.steps.iter().filter_map(validate_step));

    Ok(warnings)
}
