//! Job runner integration
//!
//! The lifecycle talks to the CI runner only through [`JobHost`]: state that
//! must survive until the save phase, step outputs, PATH additions and the
//! final failure/warning report.

pub mod actions;
pub mod local;

pub use actions::ActionsHost;
pub use local::LocalHost;

use crate::error::JvmCacheResult;
use async_trait::async_trait;
use std::path::Path;

/// Host job runner surface
#[async_trait]
pub trait JobHost: Send + Sync {
    /// Read a value saved by an earlier phase. Empty values read as `None`.
    fn get_state(&self, key: &str) -> Option<String>;

    /// Persist a value for a later phase; durable once this returns
    async fn save_state(&self, key: &str, value: &str) -> JvmCacheResult<()>;

    /// Publish a step output
    async fn set_output(&self, name: &str, value: &str) -> JvmCacheResult<()>;

    /// Prepend a directory to PATH for later job steps
    async fn add_path(&self, dir: &Path) -> JvmCacheResult<()>;

    /// Report a failure that fails the step
    fn report_failure(&self, message: &str);

    /// Report a problem that does not fail the step
    fn report_warning(&self, message: &str);
}
