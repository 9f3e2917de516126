//! JDK toolchain management through mise

use crate::config::schema::ToolchainConfig;
use crate::config::Environment;
use crate::error::{JvmCacheError, JvmCacheResult};
use crate::orchestration::run_checked;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, info};

/// Toolchain version manager interface
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Install the version manager itself
    async fn install_runtime(&self) -> JvmCacheResult<()>;

    /// Download, install and activate a JDK version
    async fn install_version(&self, version: &str) -> JvmCacheResult<()>;

    /// Activate a JDK version that is already present in the data dir
    async fn activate_version(&self, version: &str) -> JvmCacheResult<()>;

    /// Directory holding installed JDKs; archived as the runtime cache
    fn data_dir(&self) -> PathBuf;

    /// Directories later job steps need on PATH
    fn path_entries(&self) -> Vec<PathBuf>;
}

/// mise-backed toolchain
#[derive(Debug, Clone)]
pub struct MiseToolchain {
    home: PathBuf,
    local_app_data: Option<PathBuf>,
    installer_url: String,
    windows_version: String,
    mise_version: Option<String>,
}

impl MiseToolchain {
    pub fn new(config: &ToolchainConfig, env: &Environment) -> JvmCacheResult<Self> {
        Ok(Self {
            home: env.home()?.to_path_buf(),
            local_app_data: if cfg!(windows) {
                dirs::data_local_dir()
            } else {
                None
            },
            installer_url: config.mise_installer_url.clone(),
            windows_version: config.mise_windows_version.clone(),
            mise_version: env.mise_version.clone(),
        })
    }

    /// Location of the mise executable
    pub fn bin_path(&self) -> PathBuf {
        let name = if cfg!(windows) { "mise.exe" } else { "mise" };
        self.home.join(".local").join("bin").join(name)
    }

    async fn mise(&self, args: &[&str]) -> JvmCacheResult<()> {
        run_checked(self.bin_path(), args, &[]).await
    }

    async fn install_unix(&self) -> JvmCacheResult<()> {
        let script = format!("curl {} | sh", self.installer_url);
        let envs: Vec<(&str, &str)> = self
            .mise_version
            .as_deref()
            .map(|v| vec![("MISE_VERSION", v)])
            .unwrap_or_default();
        run_checked("sh", &["-c", script.as_str()], &envs).await
    }

    async fn install_windows(&self) -> JvmCacheResult<()> {
        let arch = if std::env::consts::ARCH == "aarch64" {
            "arm64"
        } else {
            "x64"
        };
        let version = self
            .mise_version
            .as_deref()
            .unwrap_or(&self.windows_version);
        let url = format!(
            "https://github.com/jdx/mise/releases/download/{v}/mise-{v}-windows-{arch}.zip",
            v = version,
            arch = arch
        );

        let bin_path = self.bin_path();
        if let Some(bin_dir) = bin_path.parent() {
            tokio::fs::create_dir_all(bin_dir).await.map_err(|e| {
                JvmCacheError::io(format!("creating {}", bin_dir.display()), e)
            })?;
        }

        let temp = std::env::temp_dir().join(format!("mise-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&temp)
            .await
            .map_err(|e| JvmCacheError::io("creating mise download dir", e))?;

        let result = self.download_windows(&url, &temp, &bin_path).await;

        if let Err(e) = tokio::fs::remove_dir_all(&temp).await {
            debug!("Failed to remove {}: {}", temp.display(), e);
        }
        result
    }

    async fn download_windows(
        &self,
        url: &str,
        temp: &std::path::Path,
        bin_path: &std::path::Path,
    ) -> JvmCacheResult<()> {
        let zip = temp.join("mise.zip");
        let zip_arg = zip.to_string_lossy();
        let temp_arg = temp.to_string_lossy();

        run_checked("curl", &["-fsSL", "-o", &*zip_arg, url], &[]).await?;
        run_checked("tar", &["-xf", &*zip_arg, "-C", &*temp_arg], &[]).await?;

        let extracted = temp.join("mise").join("bin").join("mise.exe");
        tokio::fs::copy(&extracted, bin_path).await.map_err(|e| {
            JvmCacheError::io(format!("copying {}", extracted.display()), e)
        })?;
        Ok(())
    }
}

/// mise tool argument for a JDK version
fn java_tool(version: &str) -> String {
    format!("java@{}", version)
}

#[async_trait]
impl Toolchain for MiseToolchain {
    async fn install_runtime(&self) -> JvmCacheResult<()> {
        info!("Installing mise...");
        if let Some(ref v) = self.mise_version {
            debug!("Pinned mise version {}", v);
        }

        if cfg!(windows) {
            self.install_windows().await
        } else {
            self.install_unix().await
        }
    }

    async fn install_version(&self, version: &str) -> JvmCacheResult<()> {
        info!("Installing Java {} via mise...", version);
        let tool = java_tool(version);
        self.mise(&["install", tool.as_str()]).await?;
        self.mise(&["use", "-g", tool.as_str()]).await
    }

    async fn activate_version(&self, version: &str) -> JvmCacheResult<()> {
        info!("Activating Java {}...", version);
        let tool = java_tool(version);
        self.mise(&["use", "-g", tool.as_str()]).await
    }

    fn data_dir(&self) -> PathBuf {
        if cfg!(windows) {
            return self
                .local_app_data
                .clone()
                .unwrap_or_else(|| self.home.join("AppData").join("Local"))
                .join("mise");
        }
        self.home.join(".local").join("share").join("mise")
    }

    fn path_entries(&self) -> Vec<PathBuf> {
        let mut entries = Vec::new();
        if let Some(bin_dir) = self.bin_path().parent() {
            entries.push(bin_dir.to_path_buf());
        }
        entries.push(self.data_dir().join("shims"));
        entries
    }
}
