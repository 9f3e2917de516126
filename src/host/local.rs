//! Local host for running the lifecycle outside an Actions runner
//!
//! Session state lives in a JSON file that is rewritten after every saved
//! key. Outputs are printed as `name=value` lines.

use crate::error::{JvmCacheError, JvmCacheResult};
use crate::host::JobHost;
use async_trait::async_trait;
use console::style;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::fs;
use tracing::{debug, info};

/// Host backed by a JSON session file
pub struct LocalHost {
    path: PathBuf,
    state: Mutex<BTreeMap<String, String>>,
}

impl LocalHost {
    /// Start a new session, discarding any previous one at `path`
    pub async fn create(path: PathBuf) -> JvmCacheResult<Self> {
        let host = Self {
            path,
            state: Mutex::new(BTreeMap::new()),
        };
        host.flush(&BTreeMap::new()).await?;
        debug!("Started session file {}", host.path.display());
        Ok(host)
    }

    /// Open the session written by an earlier phase. A missing file is an empty session.
    pub async fn open(path: PathBuf) -> JvmCacheResult<Self> {
        let state = if path.exists() {
            let content = fs::read_to_string(&path).await.map_err(|e| {
                JvmCacheError::io(format!("reading session file {}", path.display()), e)
            })?;
            serde_json::from_str(&content)?
        } else {
            debug!("No session file at {}", path.display());
            BTreeMap::new()
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    async fn flush(&self, snapshot: &BTreeMap<String, String>) -> JvmCacheResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| JvmCacheError::io("creating session directory", e))?;
        }

        let content = serde_json::to_string_pretty(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)
            .await
            .map_err(|e| JvmCacheError::io(format!("writing session file {}", tmp.display()), e))?;
        fs::rename(&tmp, &self.path).await.map_err(|e| {
            JvmCacheError::io(format!("replacing session file {}", self.path.display()), e)
        })
    }
}

#[async_trait]
impl JobHost for LocalHost {
    fn get_state(&self, key: &str) -> Option<String> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.get(key).filter(|v| !v.is_empty()).cloned()
    }

    async fn save_state(&self, key: &str, value: &str) -> JvmCacheResult<()> {
        let snapshot = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.insert(key.to_string(), value.to_string());
            state.clone()
        };

        self.flush(&snapshot)
            .await
            .map_err(|e| JvmCacheError::StatePersist {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    async fn set_output(&self, name: &str, value: &str) -> JvmCacheResult<()> {
        println!("{}={}", name, value);
        Ok(())
    }

    async fn add_path(&self, dir: &Path) -> JvmCacheResult<()> {
        info!("Add to PATH: {}", dir.display());
        Ok(())
    }

    fn report_failure(&self, message: &str) {
        eprintln!("{} {}", style("Error:").red().bold(), message);
    }

    fn report_warning(&self, message: &str) {
        eprintln!("{} {}", style("Warning:").yellow(), message);
    }
}
