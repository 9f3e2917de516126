//! Restore and save phases
//!
//! The two phases run as separate processes. Restore sets up the toolchain,
//! cache archives and proxy, recording what it did in the session state as it
//! goes. Save reconstructs everything from that state alone.
//!
//! Both share one driver, [`run_phase`]; they differ only in the
//! [`FailurePolicy`] applied to an error.

pub mod restore;
pub mod save;

pub use restore::{restore, RestoreReport};
pub use save::{save, SaveReport};

use crate::cache::CacheCli;
use crate::error::{JvmCacheError, JvmCacheResult};
use crate::host::JobHost;
use crate::orchestration::{ProxyControl, Toolchain};
use console::style;
use std::future::Future;
use tracing::debug;

/// External collaborators a phase drives
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub host: &'a dyn JobHost,
    pub cache: &'a dyn CacheCli,
    pub proxy: &'a dyn ProxyControl,
    pub toolchain: &'a dyn Toolchain,
}

/// What an error does to the phase's exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Report a failure and fail the step
    Fail,
    /// Report a warning and succeed anyway
    Warn,
}

/// Final status of a phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseOutcome {
    Succeeded,
    Failed,
}

impl PhaseOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Run a phase body, handling its error once according to `policy`
pub async fn run_phase<T, F>(
    phase: &str,
    policy: FailurePolicy,
    host: &dyn JobHost,
    work: F,
) -> PhaseOutcome
where
    F: Future<Output = JvmCacheResult<T>>,
{
    match work.await {
        Ok(_) => {
            debug!("{} phase finished", phase);
            PhaseOutcome::Succeeded
        }
        Err(e) => report(phase, policy, host, &e),
    }
}

/// Apply `policy` to an error raised before any job host was available
pub fn report_unhosted(phase: &str, policy: FailurePolicy, err: &JvmCacheError) -> PhaseOutcome {
    match policy {
        FailurePolicy::Fail => {
            eprintln!("{} {}", style("Error:").red().bold(), err);
            if let Some(hint) = err.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            PhaseOutcome::Failed
        }
        FailurePolicy::Warn => {
            eprintln!("{} {} failed: {}", style("Warning:").yellow().bold(), phase, err);
            PhaseOutcome::Succeeded
        }
    }
}

fn report(phase: &str, policy: FailurePolicy, host: &dyn JobHost, err: &JvmCacheError) -> PhaseOutcome {
    debug!("{} phase error: {:?}", phase, err);
    match policy {
        FailurePolicy::Fail => {
            host.report_failure(&err.to_string());
            if let Some(hint) = err.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            PhaseOutcome::Failed
        }
        FailurePolicy::Warn => {
            host.report_warning(&format!("{} failed: {}", phase, err));
            PhaseOutcome::Succeeded
        }
    }
}
