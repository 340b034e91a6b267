//! Run Monitoring Module
//!
//! Tracks how each input file moves through its processing states
//! during a run.
//!
//! # Components
//!
//! - [`ExecutionTimeline`]: Per-file state transitions and timing chart

pub mod timeline;

pub use timeline::{ExecutionTimeline, FileState, TimelineEvent};
