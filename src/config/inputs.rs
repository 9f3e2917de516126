//! Action inputs and the rules that turn them into concrete settings
//!
//! Inputs arrive as optional strings (CLI flags or `INPUT_*` variables).
//! An empty string is treated the same as an absent input.

use crate::config::Environment;
use crate::error::{JvmCacheError, JvmCacheResult};
use std::path::{Path, PathBuf};

/// Cache tag prefix used when neither input nor repository name is available
pub const FALLBACK_CACHE_TAG: &str = "java";

/// `cli-version` value that disables CLI installation
pub const SKIP_CLI_VERSION: &str = "skip";

/// Raw inputs of the restore phase
#[derive(Debug, Clone, Default)]
pub struct RestoreInputs {
    pub cli_version: Option<String>,
    pub workspace: Option<String>,
    pub cache_tag: Option<String>,
    pub java_version: Option<String>,
    pub working_directory: Option<String>,
    pub cache_java: Option<String>,
    pub proxy_port: Option<String>,
    pub read_only: Option<String>,
    pub gradle_home: Option<String>,
    pub enable_build_cache: Option<String>,
    pub proxy_no_git: Option<String>,
    pub proxy_no_platform: Option<String>,
    pub verbose: Option<String>,
}

/// Raw inputs of the save phase; explicit values override session state
#[derive(Debug, Clone, Default)]
pub struct SaveInputs {
    pub workspace: Option<String>,
    pub cache_java: Option<String>,
    pub verbose: Option<String>,
    pub exclude: Option<String>,
}

/// Non-empty, trimmed view of an optional input
pub fn value(input: &Option<String>) -> Option<&str> {
    input.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Parse a boolean input: absent or empty yields `default`, otherwise
/// only a case-insensitive `true` is true.
pub fn parse_bool(input: Option<&str>, default: bool) -> bool {
    match input.map(str::trim) {
        None | Some("") => default,
        Some(v) => v.eq_ignore_ascii_case("true"),
    }
}

/// Whether the CLI version selector asks to skip installation
pub fn is_skip(cli_version: Option<&str>) -> bool {
    cli_version.is_some_and(|v| v.trim().eq_ignore_ascii_case(SKIP_CLI_VERSION))
}

/// Resolve the cache workspace.
///
/// Falls back to `BORINGCACHE_DEFAULT_WORKSPACE`. A bare project name is
/// placed under the `default/` organization.
pub fn resolve_workspace(input: Option<&str>, env: &Environment) -> JvmCacheResult<String> {
    let raw = input
        .or(env.default_workspace.as_deref())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(JvmCacheError::WorkspaceRequired)?;

    if raw.contains('/') {
        Ok(raw.to_string())
    } else {
        Ok(format!("default/{}", raw))
    }
}

/// Resolve the cache tag prefix: input, repository name, then `java`
pub fn resolve_cache_tag_prefix(input: Option<&str>, env: &Environment) -> String {
    if let Some(tag) = input {
        return tag.to_string();
    }

    if let Some(ref repo) = env.repository {
        let name = repo.split('/').nth(1).filter(|n| !n.is_empty());
        return name.unwrap_or(repo).to_string();
    }

    FALLBACK_CACHE_TAG.to_string()
}

/// Resolve the Gradle user home, expanding a leading `~`
pub fn resolve_gradle_home(input: Option<&str>, home: &Path) -> JvmCacheResult<PathBuf> {
    let raw = input.unwrap_or("~/.gradle");

    if let Some(rest) = raw.strip_prefix('~') {
        let rest = rest.trim_start_matches(['/', '\\']);
        return Ok(if rest.is_empty() {
            home.to_path_buf()
        } else {
            home.join(rest)
        });
    }

    std::path::absolute(raw)
        .map_err(|e| JvmCacheError::io(format!("resolving gradle home {}", raw), e))
}

/// Parse the proxy port input. `None` means "pick a free port".
pub fn parse_port(input: Option<&str>) -> Option<u16> {
    input.and_then(|v| v.parse::<u16>().ok()).filter(|p| *p != 0)
}
