//! Workflow Execution Module
//!
//! Runs a workflow's ordered steps over every input file.
//!
//! # Architecture
//!
//! - [`engine`]: Orchestrates a run from config file to written outputs
//! - [`step`]: Executes a single step against a content value
//! - [`context`]: Run policy and the shared per-run context
//! - [`summary`]: Per-file outcomes returned to the caller

pub mod context;
pub mod engine;
pub mod step;
pub mod summary;

pub use context::{RunContext, RunPolicy};
pub use engine::{run, run_with_policy, Engine};
pub use summary::{FileOutcome, RunSummary};
