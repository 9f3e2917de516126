//! Error types for jvmcache
//!
//! All modules use `JvmCacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for jvmcache operations
pub type JvmCacheResult<T> = Result<T, JvmCacheError>;

/// All errors that can occur while restoring or saving a session
#[derive(Error, Debug)]
pub enum JvmCacheError {
    // Configuration errors
    #[error("Workspace required")]
    WorkspaceRequired,

    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Home directory could not be determined")]
    HomeDirUnknown,

    // Cache CLI errors
    #[error("Cache CLI not found: {0}")]
    CacheCliNotFound(String),

    #[error("Cache CLI install failed: {0}")]
    CacheCliInstall(String),

    // Proxy errors
    #[error("Proxy failed to start: {0}")]
    ProxyStart(String),

    #[error("Proxy (pid {pid}) did not become ready on port {port} within {timeout_ms}ms")]
    ProxyTimeout { pid: u32, port: u16, timeout_ms: u64 },

    #[error("Proxy (pid {pid}) exited before listening on port {port}")]
    ProxyExited { pid: u32, port: u16 },

    #[error("Failed to stop proxy (pid {pid}): {reason}")]
    ProxyStop { pid: u32, reason: String },

    // Toolchain errors
    #[error("Command failed: {command}, exit code: {code}")]
    CommandExit { command: String, code: i32 },

    // Host runner errors
    #[error("Failed to persist session state {key}: {reason}")]
    StatePersist { key: String, reason: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl JvmCacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a non-zero exit error
    pub fn command_exit(command: impl Into<String>, code: i32) -> Self {
        Self::CommandExit {
            command: command.into(),
            code,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::WorkspaceRequired => {
                Some("Set the workspace input (org/project) or export BORINGCACHE_DEFAULT_WORKSPACE")
            }
            Self::ProxyTimeout { .. } | Self::ProxyExited { .. } => {
                Some("Re-run with verbose: true and inspect the proxy log in the state directory")
            }
            Self::CacheCliNotFound(_) => Some("Set cli-version to install the cache CLI, or put it on PATH"),
            Self::HomeDirUnknown => Some("Export HOME for the job"),
            _ => None,
        }
    }
}
