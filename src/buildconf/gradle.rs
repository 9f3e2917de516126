//! Gradle init script and properties

use super::{create_dir, write_file};
use crate::error::{JvmCacheError, JvmCacheResult};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::info;

const INIT_SCRIPT_NAME: &str = "boringcache-cache.gradle";
const CACHING_PROPERTY: &str = "\norg.gradle.caching=true\n";

fn init_script(host: &str, port: u16, read_only: bool) -> String {
    format!(
        r#"gradle.settingsEvaluated {{ settings ->
    settings.buildCache {{
        remote(HttpBuildCache) {{
            url = "http://{host}:{port}/cache/"
            push = {push}
            allowInsecureProtocol = true
        }}
    }}
}}
"#,
        host = host,
        port = port,
        push = !read_only
    )
}

/// Write (or overwrite) `<gradle_home>/init.d/boringcache-cache.gradle`,
/// pointing the remote build cache at the proxy on `host:port`
pub async fn write_gradle_init_script(
    gradle_home: &Path,
    host: &str,
    port: u16,
    read_only: bool,
) -> JvmCacheResult<PathBuf> {
    let init_dir = gradle_home.join("init.d");
    create_dir(&init_dir).await?;

    let path = init_dir.join(INIT_SCRIPT_NAME);
    write_file(&path, &init_script(host, port, read_only)).await?;
    info!("Wrote Gradle init script to {}", path.display());
    Ok(path)
}

/// Append `org.gradle.caching=true` to `<gradle_home>/gradle.properties`.
///
/// Repeated runs append repeated lines; Gradle reads the last one.
pub async fn enable_gradle_build_cache(gradle_home: &Path) -> JvmCacheResult<()> {
    create_dir(gradle_home).await?;

    let path = gradle_home.join("gradle.properties");
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await
        .map_err(|e| JvmCacheError::io(format!("opening {}", path.display()), e))?;
    file.write_all(CACHING_PROPERTY.as_bytes())
        .await
        .map_err(|e| JvmCacheError::io(format!("appending to {}", path.display()), e))?;

    info!("Enabled build cache in {}", path.display());
    Ok(())
}
