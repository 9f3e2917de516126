//! Build tool detection from marker files

use std::fmt;
use std::path::Path;
use tracing::debug;

/// Build systems with a caching proxy integration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildTool {
    /// Gradle (settings/build scripts, Groovy or Kotlin DSL)
    Gradle,
    /// Maven (pom.xml)
    Maven,
    /// Neither marker found
    None,
}

/// Gradle markers, checked in order
const GRADLE_MARKERS: &[&str] = &[
    "settings.gradle",
    "settings.gradle.kts",
    "build.gradle",
    "build.gradle.kts",
];

const MAVEN_MARKER: &str = "pom.xml";

impl BuildTool {
    /// Value persisted in session state
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gradle => "gradle",
            Self::Maven => "maven",
            Self::None => "none",
        }
    }

    /// Parse a persisted value. Unknown values read as `None`.
    pub fn from_state(value: &str) -> Self {
        match value {
            "gradle" => Self::Gradle,
            "maven" => Self::Maven,
            _ => Self::None,
        }
    }

    /// Whether this build tool gets a local caching proxy
    pub fn uses_proxy(&self) -> bool {
        matches!(self, Self::Gradle | Self::Maven)
    }
}

impl fmt::Display for BuildTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classify a working directory. Gradle wins when both markers exist.
pub fn detect_build_tool(working_dir: &Path) -> BuildTool {
    if let Some(marker) = GRADLE_MARKERS
        .iter()
        .find(|marker| working_dir.join(marker).exists())
    {
        debug!("Found Gradle marker: {}", marker);
        return BuildTool::Gradle;
    }

    if working_dir.join(MAVEN_MARKER).exists() {
        debug!("Found Maven marker: {}", MAVEN_MARKER);
        return BuildTool::Maven;
    }

    BuildTool::None
}
