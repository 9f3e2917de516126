//! jvmcache - JVM toolchain and build cache lifecycle for CI
//!
//! A restore phase at the start of a job installs Java (from the cache when
//! possible), restores dependency archives and starts a local build cache
//! proxy. A save phase at the end of the job, in a separate process, stops
//! the proxy and uploads the archives, using only the session state restore
//! left behind.

pub mod buildconf;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod lifecycle;
pub mod orchestration;
pub mod project;
pub mod session;

pub use error::{JvmCacheError, JvmCacheResult};
