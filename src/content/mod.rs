//! Content Codec
//!
//! Converts between file text and the JSON content value that flows
//! through a workflow's steps.
//!
//! # Architecture
//!
//! - [`parse`] - file text to value, by input extension
//! - [`format`] - value to file text, by output extension
//! - [`custom`] - user overrides for both directions

pub mod custom;
pub mod format;
pub mod parse;

use std::path::Path;

pub use custom::{ContentFormatter, ContentParser, CustomConfig, PluginError};
pub use format::{format_default, format_value};
pub use parse::{parse_csv, parse_file, parse_text};

/// Lowercased extension of `path` without the dot, or `""`.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default()
}
