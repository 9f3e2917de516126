//! Maven build cache extension descriptor and remote configuration

use super::{create_dir, write_file};
use crate::error::{JvmCacheError, JvmCacheResult};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const EXTENSION_GROUP: &str = "org.apache.maven.extensions";
const EXTENSION_ARTIFACT: &str = "maven-build-cache-extension";
const EXTENSION_VERSION: &str = "1.2.2";

const EXTENSIONS_CLOSE: &str = "</extensions>";

/// What [`ensure_maven_extension`] did to `.mvn/extensions.xml`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionUpdate {
    AlreadyPresent,
    Inserted,
    Created,
    /// File exists without a closing tag; left untouched
    Malformed,
}

fn extension_block() -> String {
    format!(
        "  <extension>\n    <groupId>{}</groupId>\n    <artifactId>{}</artifactId>\n    <version>{}</version>\n  </extension>\n",
        EXTENSION_GROUP, EXTENSION_ARTIFACT, EXTENSION_VERSION
    )
}

fn extensions_descriptor() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<extensions xmlns="http://maven.apache.org/EXTENSIONS/1.0.0"
            xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
            xsi:schemaLocation="http://maven.apache.org/EXTENSIONS/1.0.0 https://maven.apache.org/xsd/core-extensions-1.0.0.xsd">
{}</extensions>
"#,
        extension_block()
    )
}

fn cache_config(host: &str, port: u16, read_only: bool) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<cache xmlns="http://maven.apache.org/BUILD-CACHE-CONFIG/1.2.0"
       xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
       xsi:schemaLocation="http://maven.apache.org/BUILD-CACHE-CONFIG/1.2.0 https://maven.apache.org/xsd/build-cache-config-1.2.0.xsd">
  <configuration>
    <remote enabled="true" saveToRemote="{save}" transport="resolver" id="boringcache">
      <url>http://{host}:{port}</url>
    </remote>
  </configuration>
</cache>
"#,
        save = !read_only,
        host = host,
        port = port
    )
}

/// Make sure `<working_dir>/.mvn/extensions.xml` declares the build cache extension
pub async fn ensure_maven_extension(working_dir: &Path) -> JvmCacheResult<ExtensionUpdate> {
    let mvn_dir = working_dir.join(".mvn");
    create_dir(&mvn_dir).await?;
    let path = mvn_dir.join("extensions.xml");

    let existing = match tokio::fs::read_to_string(&path).await {
        Ok(content) => Some(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            return Err(JvmCacheError::io(format!("reading {}", path.display()), e));
        }
    };

    let Some(content) = existing else {
        write_file(&path, &extensions_descriptor()).await?;
        info!("Created {} with Maven Build Cache Extension", path.display());
        return Ok(ExtensionUpdate::Created);
    };

    if content.contains(EXTENSION_ARTIFACT) {
        info!("Maven Build Cache Extension already present in .mvn/extensions.xml");
        return Ok(ExtensionUpdate::AlreadyPresent);
    }

    let Some(close) = content.find(EXTENSIONS_CLOSE) else {
        warn!(
            "{} has no {} tag; Maven Build Cache Extension not added",
            path.display(),
            EXTENSIONS_CLOSE
        );
        return Ok(ExtensionUpdate::Malformed);
    };

    let mut updated = String::with_capacity(content.len() + 200);
    updated.push_str(&content[..close]);
    updated.push_str(&extension_block());
    updated.push_str(&content[close..]);
    write_file(&path, &updated).await?;

    info!("Added Maven Build Cache Extension to existing {}", path.display());
    Ok(ExtensionUpdate::Inserted)
}

/// Write (or overwrite) `<working_dir>/.mvn/maven-build-cache-config.xml`
pub async fn write_maven_cache_config(
    working_dir: &Path,
    host: &str,
    port: u16,
    read_only: bool,
) -> JvmCacheResult<PathBuf> {
    let mvn_dir = working_dir.join(".mvn");
    create_dir(&mvn_dir).await?;

    let path = mvn_dir.join("maven-build-cache-config.xml");
    write_file(&path, &cache_config(host, port, read_only)).await?;
    info!("Wrote Maven build cache config to {}", path.display());
    Ok(path)
}
