//! fileflow - Declarative File Transformation Pipelines
//!
//! Applies an ordered list of steps to every file of an input directory
//! and writes the results to an output directory. A step is a built-in
//! content function, a user script executed out-of-process under Node.js,
//! or a filter.
//!
//! # Architecture
//!
//! - [`workflow`]: Workflow definitions and config loading
//! - [`execution`]: Run orchestration and single-step execution
//! - [`content`]: Parsing input files and formatting outputs
//! - [`sandbox`]: Isolated script invocation
//! - [`builtins`]: In-process content functions
//! - [`discovery`]: Input file listing
//! - [`environment`]: Script runtime resolution
//! - [`monitoring`]: Per-file execution timeline
//! - [`logging`]: Logger capability passed through a run
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use fileflow::execution::{run_with_policy, RunPolicy};
//! use fileflow::logging::FacadeLogger;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let policy = RunPolicy::default().with_continue_on_error(true);
//!     let summary = run_with_policy("project/workflow.json", policy, Arc::new(FacadeLogger))?;
//!
//!     println!("{}", summary.report());
//!     Ok(())
//! }
//! ```

pub mod builtins;
pub mod content;
pub mod discovery;
pub mod environment;
pub mod error;
pub mod execution;
pub mod logging;
pub mod monitoring;
pub mod sandbox;
pub mod workflow;

// Re-export commonly used types
pub use error::{FlowError, Result};
pub use execution::{run, run_with_policy, Engine, RunPolicy, RunSummary};
pub use workflow::{load_workflow, WorkflowConfig, WorkflowStep};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "fileflow";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_version() {
        assert!(!VERSION.is_empty());
        assert!(VERSION.contains('.'));
    }

    #[test]
    fn test_app_name() {
        assert_eq!(APP_NAME, "fileflow");
    }

    #[test]
    fn test_module_exports_step() {
        let step = WorkflowStep::new("shout", "built-in", "toUpperCase");
        assert_eq!(step.name, "shout");
        assert_eq!(step.step_type, "built-in");
    }

    #[test]
    fn test_module_exports_workflow() {
        let workflow = WorkflowConfig::new("wf", "./in", "./out");
        assert!(workflow.is_empty());
    }

    #[test]
    fn test_module_exports_policy() {
        assert_eq!(RunPolicy::from_force(false), RunPolicy::default());
    }
}
