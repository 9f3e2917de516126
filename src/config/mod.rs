//! Configuration management for jvmcache

pub mod inputs;
pub mod schema;

pub use inputs::{RestoreInputs, SaveInputs};
pub use schema::Config;

use crate::error::{JvmCacheError, JvmCacheResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("jvmcache")
            .join("config.toml")
    }

    /// Get the state directory path
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("jvmcache")
    }

    /// Session file used when not running under an Actions runner
    pub fn default_state_file() -> PathBuf {
        Self::state_dir().join("session.json")
    }

    /// Directory for proxy log files
    pub fn proxy_log_dir() -> PathBuf {
        Self::state_dir().join("proxy")
    }

    /// Load configuration, falling back to defaults if the file is absent
    pub async fn load(&self) -> JvmCacheResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> JvmCacheResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| JvmCacheError::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| JvmCacheError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Environment variables consulted by both phases.
///
/// Captured once at startup so the lifecycle code never reads process
/// environment directly.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// `BORINGCACHE_DEFAULT_WORKSPACE`
    pub default_workspace: Option<String>,
    /// `GITHUB_REPOSITORY` (`owner/repo`)
    pub repository: Option<String>,
    /// `MAVEN_REPO_LOCAL`
    pub maven_repo_local: Option<String>,
    /// `MISE_VERSION`
    pub mise_version: Option<String>,
    /// Home directory of the job user
    pub home_dir: Option<PathBuf>,
}

impl Environment {
    /// Snapshot the current process environment
    pub fn from_process() -> Self {
        Self {
            default_workspace: non_empty_var("BORINGCACHE_DEFAULT_WORKSPACE"),
            repository: non_empty_var("GITHUB_REPOSITORY"),
            maven_repo_local: non_empty_var("MAVEN_REPO_LOCAL"),
            mise_version: non_empty_var("MISE_VERSION"),
            home_dir: dirs::home_dir(),
        }
    }

    /// Home directory or an error when it cannot be determined
    pub fn home(&self) -> JvmCacheResult<&Path> {
        self.home_dir.as_deref().ok_or(JvmCacheError::HomeDirUnknown)
    }

    /// Local Maven repository: `MAVEN_REPO_LOCAL` or `~/.m2/repository`
    pub fn maven_local_repo(&self) -> JvmCacheResult<PathBuf> {
        if let Some(ref repo) = self.maven_repo_local {
            return Ok(PathBuf::from(repo));
        }
        Ok(self.home()?.join(".m2").join("repository"))
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
