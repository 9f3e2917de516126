//! Local caching proxy lifecycle
//!
//! The proxy is a `boringcache cache-registry` process serving Gradle and
//! Maven build-cache requests on a loopback port. Restore starts it and
//! records its pid; save stops it in a later process using only that pid.

use crate::cache::BoringCacheCli;
use crate::error::{JvmCacheError, JvmCacheResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::File;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info};

/// Everything the proxy needs to serve one workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxySettings {
    pub workspace: String,
    pub tag: String,
    pub host: String,
    pub port: u16,
    pub no_git: bool,
    pub no_platform: bool,
    pub verbose: bool,
}

impl ProxySettings {
    /// Arguments for the cache CLI's `cache-registry` command
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "cache-registry".to_string(),
            self.workspace.clone(),
            self.tag.clone(),
            "--host".to_string(),
            self.host.clone(),
            "--port".to_string(),
            self.port.to_string(),
        ];
        if self.no_git {
            args.push("--no-git".to_string());
        }
        if self.no_platform {
            args.push("--no-platform".to_string());
        }
        if self.verbose {
            args.push("--verbose".to_string());
        }
        args
    }
}

/// A started proxy process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyHandle {
    pub pid: u32,
    pub port: u16,
}

/// Local caching proxy interface
#[async_trait]
pub trait ProxyControl: Send + Sync {
    /// Ask the OS for an unused loopback port
    async fn free_port(&self) -> JvmCacheResult<u16>;

    /// Launch the proxy in the background
    async fn start(&self, settings: &ProxySettings) -> JvmCacheResult<ProxyHandle>;

    /// Block until the proxy accepts connections on `port` or `timeout` elapses
    async fn wait_ready(&self, port: u16, timeout: Duration, pid: u32) -> JvmCacheResult<()>;

    /// Terminate the proxy process. A process that is already gone is not an error.
    async fn stop(&self, pid: u32) -> JvmCacheResult<()>;
}

/// Proxy run through the cache CLI's `cache-registry` command
pub struct RegistryProxy {
    cli: BoringCacheCli,
    host: String,
    poll_interval: Duration,
    log_dir: PathBuf,
    /// Processes started by this instance, so early exits are seen before they are reaped
    children: Mutex<HashMap<u32, Child>>,
}

impl RegistryProxy {
    pub fn new(cli: BoringCacheCli, host: String, poll_interval: Duration, log_dir: PathBuf) -> Self {
        Self {
            cli,
            host,
            poll_interval,
            log_dir,
            children: Mutex::new(HashMap::new()),
        }
    }

    fn open_log(&self, port: u16) -> JvmCacheResult<(File, PathBuf)> {
        std::fs::create_dir_all(&self.log_dir).map_err(|e| {
            JvmCacheError::io(format!("creating proxy log dir {}", self.log_dir.display()), e)
        })?;

        let path = self.log_dir.join(format!("proxy-{}.log", port));
        let file = File::create(&path)
            .map_err(|e| JvmCacheError::io(format!("creating proxy log {}", path.display()), e))?;
        Ok((file, path))
    }

    /// Whether `pid` is known to have exited
    fn has_exited(&self, pid: u32) -> bool {
        let mut children = self.children.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(child) = children.get_mut(&pid) {
            return matches!(child.try_wait(), Ok(Some(_)));
        }
        !process_alive(pid)
    }
}

#[async_trait]
impl ProxyControl for RegistryProxy {
    async fn free_port(&self) -> JvmCacheResult<u16> {
        let listener = std::net::TcpListener::bind((self.host.as_str(), 0))
            .map_err(|e| JvmCacheError::io("binding an ephemeral port", e))?;
        let port = listener
            .local_addr()
            .map_err(|e| JvmCacheError::io("reading ephemeral port", e))?
            .port();
        debug!("Selected free port {}", port);
        Ok(port)
    }

    async fn start(&self, settings: &ProxySettings) -> JvmCacheResult<ProxyHandle> {
        let (log, log_path) = self.open_log(settings.port)?;
        let log_err = log
            .try_clone()
            .map_err(|e| JvmCacheError::io("duplicating proxy log handle", e))?;

        let program = self.cli.program();
        let args = settings.args();
        debug!("Starting proxy: {} {}", program.display(), args.join(" "));

        let mut command = Command::new(&program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err));

        // Own process group so the job's signals to restore do not reach it
        #[cfg(unix)]
        command.process_group(0);

        let child = command
            .spawn()
            .map_err(|e| JvmCacheError::ProxyStart(format!("{}: {}", program.display(), e)))?;

        let pid = child
            .id()
            .ok_or_else(|| JvmCacheError::ProxyStart("process exited immediately".to_string()))?;

        self.children
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(pid, child);

        info!(
            "Started cache proxy (pid {}) on {}:{}, log: {}",
            pid,
            settings.host,
            settings.port,
            log_path.display()
        );

        Ok(ProxyHandle {
            pid,
            port: settings.port,
        })
    }

    async fn wait_ready(&self, port: u16, ready_timeout: Duration, pid: u32) -> JvmCacheResult<()> {
        let deadline = Instant::now() + ready_timeout;

        loop {
            let connect = TcpStream::connect((self.host.as_str(), port));
            if let Ok(Ok(_)) = timeout(self.poll_interval, connect).await {
                debug!("Proxy (pid {}) ready on port {}", pid, port);
                return Ok(());
            }

            if self.has_exited(pid) {
                return Err(JvmCacheError::ProxyExited { pid, port });
            }

            if Instant::now() >= deadline {
                return Err(JvmCacheError::ProxyTimeout {
                    pid,
                    port,
                    timeout_ms: ready_timeout.as_millis() as u64,
                });
            }

            sleep(self.poll_interval).await;
        }
    }

    async fn stop(&self, pid: u32) -> JvmCacheResult<()> {
        terminate(pid).await?;
        self.children
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&pid);
        Ok(())
    }
}

/// Liveness check for a process this instance did not start
#[cfg(unix)]
fn process_alive(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if pid <= 0 {
        return false;
    }
    // SAFETY: signal 0 performs only the existence and permission check.
    let rc = unsafe { libc::kill(pid, 0) };
    rc == 0 || std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
fn process_alive(_pid: u32) -> bool {
    true
}

#[cfg(unix)]
async fn terminate(pid: u32) -> JvmCacheResult<()> {
    let target = libc::pid_t::try_from(pid)
        .ok()
        .filter(|p| *p > 0)
        .ok_or_else(|| JvmCacheError::ProxyStop {
            pid,
            reason: "invalid pid".to_string(),
        })?;

    // SAFETY: target is a positive pid, so only that single process is signalled.
    let rc = unsafe { libc::kill(target, libc::SIGTERM) };
    if rc == 0 {
        return Ok(());
    }

    let err = std::io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        debug!("Proxy (pid {}) already exited", pid);
        return Ok(());
    }

    Err(JvmCacheError::ProxyStop {
        pid,
        reason: err.to_string(),
    })
}

#[cfg(not(unix))]
async fn terminate(pid: u32) -> JvmCacheResult<()> {
    let pid_arg = pid.to_string();
    crate::orchestration::run_checked("taskkill", &["/PID", pid_arg.as_str(), "/T", "/F"], &[])
        .await
        .map_err(|e| JvmCacheError::ProxyStop {
            pid,
            reason: e.to_string(),
        })
}
