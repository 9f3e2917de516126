//! Project inspection: build tool detection and JDK version resolution
//!
//! Both are pure reads of marker files in the working directory. A missing
//! or unreadable file is a normal outcome, never an error.

pub mod build_tool;
pub mod runtime_version;

pub use build_tool::{detect_build_tool, BuildTool};
pub use runtime_version::{resolve_runtime_version, DEFAULT_JAVA_VERSION};
