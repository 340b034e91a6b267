//! Workflow Definition Module
//!
//! Provides data structures and utilities for defining, loading and
//! validating file-processing workflows.
//!
//! # Structure
//!
//! - [`model`]: Core data structures (WorkflowConfig, WorkflowStep)
//! - [`parser`]: JSON/YAML loading
//! - [`validator`]: Load-time checks and warnings

pub mod model;
pub mod parser;
pub mod validator;

pub use model::{OutputNaming, StepKind, WorkflowConfig, WorkflowStep};
pub use parser::{load_workflow, workflow_root, ConfigFormat};
pub use validator::{validate_workflow, ValidationError, ValidationWarning};
