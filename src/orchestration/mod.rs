//! Orchestration of external processes
//!
//! Provides the collaborators the lifecycle drives:
//! - the local caching proxy (started by restore, stopped by save)
//! - the JDK toolchain manager (mise)
//!
//! plus the subprocess helpers they share with the cache CLI adapter.

pub mod proxy;
pub mod toolchain;

pub use proxy::{ProxyControl, ProxyHandle, ProxySettings, RegistryProxy};
pub use toolchain::{MiseToolchain, Toolchain};

use crate::error::{JvmCacheError, JvmCacheResult};
use std::ffi::OsStr;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::debug;

/// Render a command line for logs and error messages
pub(crate) fn display_command<S: AsRef<OsStr>>(program: impl AsRef<OsStr>, args: &[S]) -> String {
    let mut line = program.as_ref().to_string_lossy().into_owned();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.as_ref().to_string_lossy());
    }
    line
}

/// Run a command with inherited stdio and fail on a non-zero exit.
///
/// Used for installer steps whose output belongs in the job log as-is.
pub(crate) async fn run_checked<S: AsRef<OsStr>>(
    program: impl AsRef<OsStr>,
    args: &[S],
    envs: &[(&str, &str)],
) -> JvmCacheResult<()> {
    let line = display_command(&program, args);
    debug!("Executing: {}", line);

    let status = Command::new(&program)
        .args(args)
        .envs(envs.iter().copied())
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|e| JvmCacheError::command_failed(line.clone(), e))?;

    if status.success() {
        Ok(())
    } else {
        Err(JvmCacheError::command_exit(line, status.code().unwrap_or(-1)))
    }
}

/// Pipe a child's output line arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputStream {
    Stdout,
    Stderr,
}

/// Stream stdout+stderr from a child process, calling `on_output` for each line.
///
/// Returns all collected lines in arrival order. Pipes that were not
/// configured are skipped.
pub(crate) async fn stream_child_output(
    child: &mut Child,
    on_output: &(dyn Fn(OutputStream, &str) + Send + Sync),
) -> Vec<String> {
    let mut stdout_reader = child.stdout.take().map(|s| BufReader::new(s).lines());
    let mut stderr_reader = child.stderr.take().map(|s| BufReader::new(s).lines());

    let mut all_output = Vec::new();
    let mut stdout_done = stdout_reader.is_none();
    let mut stderr_done = stderr_reader.is_none();

    while !stderr_done || !stdout_done {
        tokio::select! {
            line = next_line(&mut stderr_reader), if !stderr_done => {
                match line {
                    Some(line) => {
                        on_output(OutputStream::Stderr, &line);
                        all_output.push(line);
                    }
                    None => stderr_done = true,
                }
            }
            line = next_line(&mut stdout_reader), if !stdout_done => {
                match line {
                    Some(line) => {
                        on_output(OutputStream::Stdout, &line);
                        all_output.push(line);
                    }
                    None => stdout_done = true,
                }
            }
        }
    }

    all_output
}

async fn next_line<R>(reader: &mut Option<tokio::io::Lines<R>>) -> Option<String>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    match reader {
        Some(lines) => lines.next_line().await.ok().flatten(),
        None => None,
    }
}
