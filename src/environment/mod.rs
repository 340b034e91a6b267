//! Environment Module
//!
//! Locates the external runtime used to execute transform scripts.

pub mod node;

pub use node::{node_available, runtime_version, NODE_PATH, RUNTIME_ENV_VAR};
