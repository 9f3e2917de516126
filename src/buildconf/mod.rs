//! Build tool configuration pointing Gradle and Maven at the local proxy

pub mod gradle;
pub mod maven;

pub use gradle::{enable_gradle_build_cache, write_gradle_init_script};
pub use maven::{ensure_maven_extension, write_maven_cache_config, ExtensionUpdate};

use crate::error::{JvmCacheError, JvmCacheResult};
use std::path::Path;

async fn create_dir(dir: &Path) -> JvmCacheResult<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| JvmCacheError::io(format!("creating {}", dir.display()), e))
}

async fn write_file(path: &Path, content: &str) -> JvmCacheResult<()> {
    tokio::fs::write(path, content)
        .await
        .map_err(|e| JvmCacheError::io(format!("writing {}", path.display()), e))
}
