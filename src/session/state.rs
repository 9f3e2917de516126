//! Typed view of the session record
//!
//! Restore writes the record one key at a time through [`SessionRecorder`],
//! so a run that dies half-way leaves every key written so far. Save reads
//! it back with [`SessionState::load`]; every field is optional and callers
//! supply their own fallback.

use crate::error::JvmCacheResult;
use crate::host::JobHost;
use crate::project::BuildTool;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Keys of the persisted session record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    Workspace,
    CacheTagPrefix,
    RuntimeVersion,
    WorkingDir,
    CacheRuntime,
    BuildTool,
    Verbose,
    ProxyPid,
    MavenTag,
    MavenRestored,
}

impl SessionKey {
    /// Key name in the host's state store
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Workspace => "workspace",
            Self::CacheTagPrefix => "cacheTagPrefix",
            Self::RuntimeVersion => "runtimeVersion",
            Self::WorkingDir => "workingDir",
            Self::CacheRuntime => "cacheRuntime",
            Self::BuildTool => "buildTool",
            Self::Verbose => "verbose",
            Self::ProxyPid => "proxyPid",
            Self::MavenTag => "mavenTag",
            Self::MavenRestored => "mavenRestored",
        }
    }
}

/// Session record as read by the save phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub workspace: Option<String>,
    pub cache_tag_prefix: Option<String>,
    pub runtime_version: Option<String>,
    pub working_dir: Option<PathBuf>,
    pub cache_runtime: Option<bool>,
    pub build_tool: Option<BuildTool>,
    pub verbose: Option<bool>,
    pub proxy_pid: Option<u32>,
    pub maven_tag: Option<String>,
    pub maven_restored: Option<bool>,
}

impl SessionState {
    /// Read whatever the restore phase managed to persist
    pub fn load(host: &dyn JobHost) -> Self {
        let get = |key: SessionKey| host.get_state(key.as_str());

        let state = Self {
            workspace: get(SessionKey::Workspace),
            cache_tag_prefix: get(SessionKey::CacheTagPrefix),
            runtime_version: get(SessionKey::RuntimeVersion),
            working_dir: get(SessionKey::WorkingDir).map(PathBuf::from),
            cache_runtime: get(SessionKey::CacheRuntime).and_then(|v| parse_flag(&v)),
            build_tool: get(SessionKey::BuildTool).map(|v| BuildTool::from_state(&v)),
            verbose: get(SessionKey::Verbose).and_then(|v| parse_flag(&v)),
            proxy_pid: get(SessionKey::ProxyPid).and_then(|v| parse_pid(&v)),
            maven_tag: get(SessionKey::MavenTag),
            maven_restored: get(SessionKey::MavenRestored).and_then(|v| parse_flag(&v)),
        };
        debug!("Loaded session state: {:?}", state);
        state
    }

    /// Whether restore left runtime caching on. An unrecorded flag counts as on.
    pub fn runtime_cache_enabled(&self) -> bool {
        self.cache_runtime.unwrap_or(true)
    }

    /// Recorded verbosity, off when unrecorded
    pub fn verbose(&self) -> bool {
        self.verbose.unwrap_or(false)
    }

    /// Recorded build tool, `None` when unrecorded
    pub fn build_tool(&self) -> BuildTool {
        self.build_tool.unwrap_or(BuildTool::None)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Pids are positive; anything else would signal more than one process
fn parse_pid(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|pid| *pid > 0)
}

/// Facts established by the first restore step
#[derive(Debug, Clone)]
pub struct SessionSetup<'a> {
    pub workspace: &'a str,
    pub cache_tag_prefix: &'a str,
    pub runtime_version: &'a str,
    pub working_dir: &'a Path,
    pub cache_runtime: bool,
    pub build_tool: BuildTool,
    pub verbose: bool,
}

/// Writes session keys as soon as each fact is known
pub struct SessionRecorder<'a> {
    host: &'a dyn JobHost,
}

impl<'a> SessionRecorder<'a> {
    pub fn new(host: &'a dyn JobHost) -> Self {
        Self { host }
    }

    async fn put(&self, key: SessionKey, value: &str) -> JvmCacheResult<()> {
        self.host.save_state(key.as_str(), value).await
    }

    /// Persist the resolved job setup
    pub async fn setup(&self, setup: &SessionSetup<'_>) -> JvmCacheResult<()> {
        self.put(SessionKey::Workspace, setup.workspace).await?;
        self.put(SessionKey::CacheTagPrefix, setup.cache_tag_prefix).await?;
        self.put(SessionKey::RuntimeVersion, setup.runtime_version).await?;
        self.put(SessionKey::WorkingDir, &setup.working_dir.to_string_lossy())
            .await?;
        self.put(SessionKey::CacheRuntime, bool_str(setup.cache_runtime))
            .await?;
        self.put(SessionKey::BuildTool, setup.build_tool.as_str()).await?;
        self.put(SessionKey::Verbose, bool_str(setup.verbose)).await
    }

    /// Hand the proxy over to the save phase
    pub async fn proxy_pid(&self, pid: u32) -> JvmCacheResult<()> {
        self.put(SessionKey::ProxyPid, &pid.to_string()).await
    }

    /// Record the Maven dependency archive and whether it was restored
    pub async fn maven(&self, tag: &str, restored: bool) -> JvmCacheResult<()> {
        self.put(SessionKey::MavenTag, tag).await?;
        self.put(SessionKey::MavenRestored, bool_str(restored)).await
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
