//! Input File Discovery
//!
//! Lists the files a run will process: regular files directly inside the
//! input directory, in file-name order. Subdirectories are not descended.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{FlowError, Result};
use crate::logging::Logger;

/// Returns the regular files in `dir`, sorted by file name.
///
/// A missing directory is reported as a warning and yields no files.
pub fn discover_files(dir: &Path, logger: &dyn Logger) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        let missing = FlowError::DirectoryMissing {
            path: dir.to_path_buf(),
        };
        logger.warn(&missing.to_string());
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir)
        .map_err(|e| FlowError::io(format!("failed to list '{}'", dir.display()), e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| FlowError::io(format!("failed to list '{}'", dir.display()), e))?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        } else {
            debug!("Ignoring non-file entry: {}", path.display());
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!("Discovered {} file(s) in {}", files.len(), dir.display());

    Ok(files)
}
