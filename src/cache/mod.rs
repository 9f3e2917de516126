//! Cache transfer integration
//!
//! Archives live under tags derived from the cache tag prefix:
//!
//! | Tag | Local path | Restored | Saved |
//! |-----|------------|----------|-------|
//! | `{prefix}-runtime-{version}` | mise data dir | when `cache-java` | when `cache-java` |
//! | `{prefix}-maven-deps` | local Maven repository | Maven projects | Maven projects |
//!
//! Gradle and Maven build-cache entries do not go through these archives;
//! they are served by the local caching proxy.

pub mod cli;
pub mod hit;

pub use cli::{BoringCacheCli, CacheCli, CacheOutput, Transfer};
pub use hit::classify;

/// Tag of the archived JDK installation
pub fn runtime_tag(prefix: &str, version: &str) -> String {
    format!("{}-runtime-{}", prefix, version)
}

/// Tag of the archived Maven dependency repository
pub fn maven_deps_tag(prefix: &str) -> String {
    format!("{}-maven-deps", prefix)
}
