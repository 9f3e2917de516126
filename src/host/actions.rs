//! GitHub Actions runner host
//!
//! State and outputs are appended to the runner's command files as heredoc
//! records. The runner replays saved state to the post step as `STATE_<key>`
//! environment variables.

use crate::error::{JvmCacheError, JvmCacheResult};
use crate::host::JobHost;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use uuid::Uuid;

/// Host backed by `$GITHUB_STATE`, `$GITHUB_OUTPUT` and `$GITHUB_PATH`
pub struct ActionsHost {
    state_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
    path_file: Option<PathBuf>,
    replayed: HashMap<String, String>,
    written: Mutex<HashMap<String, String>>,
}

impl ActionsHost {
    /// Whether the process runs as an Actions step
    pub fn detected() -> bool {
        std::env::var_os("GITHUB_STATE").is_some()
    }

    /// Build from the current process environment
    pub fn from_env() -> Self {
        let file = |name: &str| std::env::var_os(name).map(PathBuf::from);
        let replayed = std::env::vars()
            .filter_map(|(k, v)| k.strip_prefix("STATE_").map(|key| (key.to_string(), v)))
            .collect();

        Self::new(
            file("GITHUB_STATE"),
            file("GITHUB_OUTPUT"),
            file("GITHUB_PATH"),
            replayed,
        )
    }

    pub fn new(
        state_file: Option<PathBuf>,
        output_file: Option<PathBuf>,
        path_file: Option<PathBuf>,
        replayed: HashMap<String, String>,
    ) -> Self {
        Self {
            state_file,
            output_file,
            path_file,
            replayed,
            written: Mutex::new(HashMap::new()),
        }
    }
}

/// Format a `key<<delimiter` record understood by the runner
fn heredoc_record(key: &str, value: &str) -> String {
    let mut delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
    while key.contains(&delimiter) || value.contains(&delimiter) {
        delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
    }
    format!("{key}<<{delimiter}\n{value}\n{delimiter}\n")
}

/// Escape a workflow command message
fn escape_message(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

async fn append(path: &Path, content: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(content.as_bytes()).await?;
    file.flush().await
}

#[async_trait]
impl JobHost for ActionsHost {
    fn get_state(&self, key: &str) -> Option<String> {
        let written = self.written.lock().unwrap_or_else(|e| e.into_inner());
        written
            .get(key)
            .or_else(|| self.replayed.get(key))
            .filter(|v| !v.is_empty())
            .cloned()
    }

    async fn save_state(&self, key: &str, value: &str) -> JvmCacheResult<()> {
        let path = self.state_file.as_ref().ok_or_else(|| JvmCacheError::StatePersist {
            key: key.to_string(),
            reason: "GITHUB_STATE is not set".to_string(),
        })?;

        append(path, &heredoc_record(key, value))
            .await
            .map_err(|e| JvmCacheError::StatePersist {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        self.written
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        debug!("Saved state {}={}", key, value);
        Ok(())
    }

    async fn set_output(&self, name: &str, value: &str) -> JvmCacheResult<()> {
        match self.output_file {
            Some(ref path) => append(path, &heredoc_record(name, value))
                .await
                .map_err(|e| JvmCacheError::io(format!("writing output {}", name), e)),
            None => {
                info!("Output {}={}", name, value);
                Ok(())
            }
        }
    }

    async fn add_path(&self, dir: &Path) -> JvmCacheResult<()> {
        match self.path_file {
            Some(ref path) => append(path, &format!("{}\n", dir.display()))
                .await
                .map_err(|e| JvmCacheError::io(format!("adding {} to PATH", dir.display()), e)),
            None => {
                debug!("GITHUB_PATH not set, not adding {}", dir.display());
                Ok(())
            }
        }
    }

    fn report_failure(&self, message: &str) {
        println!("::error::{}", escape_message(message));
    }

    fn report_warning(&self, message: &str) {
        println!("::warning::{}", escape_message(message));
    }
}
