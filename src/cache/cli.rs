//! Cache CLI adapter
//!
//! Wraps the `boringcache` executable: installation on demand and
//! restore/save invocations whose output is streamed to the job log and
//! captured for hit classification.

use crate::cache::hit;
use crate::config::schema::CacheConfig;
use crate::config::Environment;
use crate::error::{JvmCacheError, JvmCacheResult};
use crate::orchestration::{display_command, run_checked, stream_child_output, OutputStream};
use async_trait::async_trait;
use semver::Version;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

/// Result of one cache CLI invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOutput {
    /// Process exit code (-1 when killed by a signal)
    pub exit_code: i32,
    /// Combined stdout and stderr, one line per entry, joined by newlines
    pub output: String,
}

impl CacheOutput {
    /// Whether a restore with this result hit the cache
    pub fn is_hit(&self) -> bool {
        hit::classify(self.exit_code, &self.output)
    }
}

/// Cache transfer engine interface
#[async_trait]
pub trait CacheCli: Send + Sync {
    /// Make sure the CLI is installed, at `version` when one is given
    async fn ensure(&self, version: Option<&str>) -> JvmCacheResult<()>;

    /// Run the CLI with `args`, returning its exit code and captured output
    async fn exec(&self, args: &[String]) -> JvmCacheResult<CacheOutput>;
}

/// One archive transfer between a local path and a cache tag
#[derive(Debug, Clone)]
pub struct Transfer<'a> {
    pub workspace: &'a str,
    pub tag: &'a str,
    pub path: &'a Path,
    pub verbose: bool,
    pub exclude: Option<&'a str>,
}

impl Transfer<'_> {
    fn target(&self) -> String {
        format!("{}:{}", self.tag, self.path.display())
    }

    /// `restore <workspace> <tag>:<path> [--verbose]`
    pub fn restore_args(&self) -> Vec<String> {
        let mut args = vec![
            "restore".to_string(),
            self.workspace.to_string(),
            self.target(),
        ];
        if self.verbose {
            args.push("--verbose".to_string());
        }
        args
    }

    /// `save <workspace> <tag>:<path> [--verbose] [--exclude <pattern>]`
    pub fn save_args(&self) -> Vec<String> {
        let mut args = vec!["save".to_string(), self.workspace.to_string(), self.target()];
        if self.verbose {
            args.push("--verbose".to_string());
        }
        if let Some(pattern) = self.exclude {
            args.push("--exclude".to_string());
            args.push(pattern.to_string());
        }
        args
    }
}

/// The `boringcache` executable
#[derive(Debug, Clone)]
pub struct BoringCacheCli {
    binary: String,
    installer_url: String,
    install_dir: Option<PathBuf>,
}

impl BoringCacheCli {
    /// Create an adapter from configuration
    pub fn new(config: &CacheConfig, env: &Environment) -> Self {
        Self {
            binary: config.binary.clone(),
            installer_url: config.installer_url.clone(),
            install_dir: env.home_dir.as_ref().map(|h| h.join(".local").join("bin")),
        }
    }

    /// Executable to launch: an explicit path, the installer's copy, or a PATH lookup
    pub fn program(&self) -> PathBuf {
        let configured = Path::new(&self.binary);
        if configured.components().count() > 1 {
            return configured.to_path_buf();
        }

        if let Some(ref dir) = self.install_dir {
            let installed = dir.join(executable_name(&self.binary));
            if installed.exists() {
                return installed;
            }
        }

        configured.to_path_buf()
    }

    /// Version reported by `--version`, if the CLI runs at all
    async fn installed_version(&self) -> Option<Version> {
        let output = Command::new(self.program())
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .ok()?;

        if !output.status.success() {
            return None;
        }

        parse_version_output(&String::from_utf8_lossy(&output.stdout))
    }

    async fn install(&self, version: Option<&str>) -> JvmCacheResult<()> {
        if cfg!(windows) {
            return Err(JvmCacheError::CacheCliInstall(
                "automatic installation is not supported on Windows".to_string(),
            ));
        }

        info!(
            "Installing {} {}...",
            self.binary,
            version.unwrap_or("(latest)")
        );

        let script = format!("curl -fsSL {} | sh", self.installer_url);
        let envs: Vec<(&str, &str)> = version
            .map(|v| vec![("BORINGCACHE_VERSION", v)])
            .unwrap_or_default();

        run_checked("sh", &["-c", script.as_str()], &envs)
            .await
            .map_err(|e| JvmCacheError::CacheCliInstall(e.to_string()))
    }
}

#[async_trait]
impl CacheCli for BoringCacheCli {
    async fn ensure(&self, version: Option<&str>) -> JvmCacheResult<()> {
        let requested = version
            .map(str::trim)
            .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("latest"));

        let installed = self.installed_version().await;
        if let Some(ref current) = installed {
            if satisfies(requested, current) {
                info!("{} {} already installed", self.binary, current);
                return Ok(());
            }
            debug!(
                "Installed {} {} does not match requested {:?}",
                self.binary, current, requested
            );
        }

        self.install(requested).await?;

        let current = self.installed_version().await.ok_or_else(|| {
            JvmCacheError::CacheCliNotFound(self.program().display().to_string())
        })?;
        if !satisfies(requested, &current) {
            return Err(JvmCacheError::CacheCliInstall(format!(
                "requested {} {} but {} is installed",
                self.binary,
                requested.unwrap_or_default(),
                current
            )));
        }
        info!("Installed {} {}", self.binary, current);
        Ok(())
    }

    async fn exec(&self, args: &[String]) -> JvmCacheResult<CacheOutput> {
        let program = self.program();
        let line = display_command(&program, args);
        debug!("Executing: {}", line);

        let mut child = Command::new(&program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| JvmCacheError::command_failed(line.clone(), e))?;

        let lines = stream_child_output(&mut child, &|stream, line: &str| match stream {
            OutputStream::Stdout => println!("{}", line),
            OutputStream::Stderr => eprintln!("{}", line),
        })
        .await;

        let status = child
            .wait()
            .await
            .map_err(|e| JvmCacheError::command_failed(line, e))?;

        Ok(CacheOutput {
            exit_code: status.code().unwrap_or(-1),
            output: lines.join("\n"),
        })
    }
}

fn executable_name(binary: &str) -> String {
    if cfg!(windows) && !binary.ends_with(".exe") {
        format!("{}.exe", binary)
    } else {
        binary.to_string()
    }
}

/// Find the first semver-looking token in `--version` output
fn parse_version_output(output: &str) -> Option<Version> {
    output.split_whitespace().find_map(parse_requested)
}

/// Whether `current` meets the request; no request accepts any version
fn satisfies(requested: Option<&str>, current: &Version) -> bool {
    match requested {
        None => true,
        Some(req) => parse_requested(req).as_ref() == Some(current),
    }
}

fn parse_requested(version: &str) -> Option<Version> {
    Version::parse(version.trim().trim_start_matches('v')).ok()
}
