//! Configuration schema for jvmcache
//!
//! Configuration is stored at `~/.config/jvmcache/config.toml`. Every key is
//! optional; a missing file yields the defaults below.

use serde::Deserialize;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache CLI settings
    pub cache: CacheConfig,

    /// Local caching proxy settings
    pub proxy: ProxyConfig,

    /// Toolchain (mise) settings
    pub toolchain: ToolchainConfig,
}

/// Cache CLI settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Executable name or path of the cache CLI
    pub binary: String,

    /// Install script piped to `sh` when the CLI is missing
    pub installer_url: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            binary: "boringcache".to_string(),
            installer_url: "https://install.boringcache.com/install.sh".to_string(),
        }
    }
}

/// Local caching proxy settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Bind address handed to the proxy
    pub host: String,

    /// How long restore waits for the proxy to accept connections
    pub ready_timeout_ms: u64,

    /// Delay between readiness checks
    pub poll_interval_ms: u64,
}

impl ProxyConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(10))
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            ready_timeout_ms: 20_000,
            poll_interval_ms: 250,
        }
    }
}

/// Toolchain settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Install script for mise on Unix
    pub mise_installer_url: String,

    /// Release used on Windows when MISE_VERSION is unset
    pub mise_windows_version: String,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            mise_installer_url: "https://mise.run".to_string(),
            mise_windows_version: "v2026.2.8".to_string(),
        }
    }
}
