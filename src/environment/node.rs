//! Script Runtime Resolution
//!
//! Transform scripts run under Node.js. The binary is resolved once per
//! process in the following order:
//! 1. The `FILEFLOW_NODE` environment variable
//! 2. `node` found on the system PATH
//! 3. The bare name `node`, left for the OS to resolve at spawn time

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, info, warn};
use once_cell::sync::Lazy;

/// Environment variable overriding the runtime binary.
pub const RUNTIME_ENV_VAR: &str = "FILEFLOW_NODE";

/// Lazily-resolved path to the Node.js binary.
pub static NODE_PATH: Lazy<PathBuf> = Lazy::new(|| {
    if let Some(path) = std::env::var_os(RUNTIME_ENV_VAR).filter(|v| !v.is_empty()) {
        let path = PathBuf::from(path);
        info!("Using script runtime from {}: {}", RUNTIME_ENV_VAR, path.display());
        return path;
    }

    if let Ok(output) = Command::new("which").arg("node").output() {
        if output.status.success() {
            let path_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !path_str.is_empty() {
                let system_path = PathBuf::from(path_str);
                debug!("Using system node: {}", system_path.display());
                return system_path;
            }
        }
    }

    warn!("Node.js binary not found on PATH; transform steps will fail to start");
    warn!("  Set {} to the node binary to override", RUNTIME_ENV_VAR);
    PathBuf::from("node")
});

/// Returns the version string reported by a runtime binary, if it runs.
pub fn runtime_version(runtime: &Path) -> Option<String> {
    let output = Command::new(runtime)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!version.is_empty()).then_some(version)
}

/// True if the default runtime can be launched.
pub fn node_available() -> bool {
    runtime_version(&NODE_PATH).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_version_missing_binary() {
        assert!(runtime_version(Path::new("/nonexistent/bin/node")).is_none());
    }

    #[test]
    fn test_node_path_is_not_empty() {
        assert!(!NODE_PATH.as_os_str().is_empty());
    }

    #[test]
    fn test_runtime_version_reports_when_available() {
        if !node_available() {
            return;
        }
        let version = runtime_version(&NODE_PATH).unwrap();
        assert!(version.starts_with('v'));
    }
}
