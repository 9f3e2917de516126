//! JDK version resolution

use std::fs;
use std::path::Path;
use tracing::debug;

/// Version installed when nothing else pins one
pub const DEFAULT_JAVA_VERSION: &str = "21";

/// Resolve the JDK version to install.
///
/// Precedence: explicit input, `.java-version`, the `java` entry of
/// `.tool-versions`, then [`DEFAULT_JAVA_VERSION`].
pub fn resolve_runtime_version(explicit: Option<&str>, working_dir: &Path) -> String {
    if let Some(version) = explicit.map(str::trim).filter(|v| !v.is_empty()) {
        return version.to_string();
    }

    if let Some(version) = read_java_version_file(working_dir) {
        debug!("Using Java {} from .java-version", version);
        return version;
    }

    if let Some(version) = read_tool_versions_file(working_dir) {
        debug!("Using Java {} from .tool-versions", version);
        return version;
    }

    DEFAULT_JAVA_VERSION.to_string()
}

fn read_java_version_file(working_dir: &Path) -> Option<String> {
    let content = fs::read_to_string(working_dir.join(".java-version")).ok()?;
    let version = content.trim();
    (!version.is_empty()).then(|| version.to_string())
}

fn read_tool_versions_file(working_dir: &Path) -> Option<String> {
    let content = fs::read_to_string(working_dir.join(".tool-versions")).ok()?;
    let line = content.lines().find(|line| line.starts_with("java "))?;
    line.split_whitespace().nth(1).map(str::to_string)
}
