//! CLI argument definitions using clap derive
//!
//! Action inputs are long flags that also read the runner's `INPUT_<NAME>`
//! variables, so one binary serves both as an Actions step and locally.

use crate::config::inputs::{RestoreInputs, SaveInputs};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// jvmcache - JVM toolchain and build cache for CI
///
/// Restores a JDK and dependency archives at the start of a job, runs a
/// local build cache proxy for Gradle or Maven, and saves everything back
/// at the end.
#[derive(Parser, Debug)]
#[command(name = "jvmcache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "JVMCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Session state file (instead of the runner's state store)
    #[arg(long, global = true, env = "JVMCACHE_STATE_FILE")]
    pub state_file: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Set up Java, restore caches and start the build cache proxy
    Restore(RestoreArgs),

    /// Stop the proxy and save caches
    Save(SaveArgs),
}

/// Arguments for the restore command
#[derive(Parser, Debug, Default)]
pub struct RestoreArgs {
    /// Cache CLI version to install ("skip" to use whatever is installed)
    #[arg(long, env = "INPUT_CLI-VERSION")]
    pub cli_version: Option<String>,

    /// Cache workspace (org/project)
    #[arg(long, env = "INPUT_WORKSPACE")]
    pub workspace: Option<String>,

    /// Cache tag prefix (defaults to the repository name)
    #[arg(long, env = "INPUT_CACHE-TAG")]
    pub cache_tag: Option<String>,

    /// Java version (defaults to .java-version, .tool-versions, then 21)
    #[arg(long, env = "INPUT_JAVA-VERSION")]
    pub java_version: Option<String>,

    /// Project directory (defaults to current directory)
    #[arg(long, env = "INPUT_WORKING-DIRECTORY")]
    pub working_directory: Option<String>,

    /// Cache the Java installation
    #[arg(long, env = "INPUT_CACHE-JAVA")]
    pub cache_java: Option<String>,

    /// Proxy port (defaults to a free port)
    #[arg(long, env = "INPUT_PROXY-PORT")]
    pub proxy_port: Option<String>,

    /// Never push build cache entries
    #[arg(long, env = "INPUT_READ-ONLY")]
    pub read_only: Option<String>,

    /// Gradle user home
    #[arg(long, env = "INPUT_GRADLE-HOME")]
    pub gradle_home: Option<String>,

    /// Turn on org.gradle.caching in the Gradle user home
    #[arg(long, env = "INPUT_ENABLE-BUILD-CACHE")]
    pub enable_build_cache: Option<String>,

    /// Start the proxy without git metadata
    #[arg(long, env = "INPUT_PROXY-NO-GIT")]
    pub proxy_no_git: Option<String>,

    /// Start the proxy without platform metadata
    #[arg(long, env = "INPUT_PROXY-NO-PLATFORM")]
    pub proxy_no_platform: Option<String>,

    /// Verbose cache CLI output
    #[arg(long = "cache-verbose", env = "INPUT_VERBOSE")]
    pub cache_verbose: Option<String>,
}

impl From<RestoreArgs> for RestoreInputs {
    fn from(args: RestoreArgs) -> Self {
        Self {
            cli_version: args.cli_version,
            workspace: args.workspace,
            cache_tag: args.cache_tag,
            java_version: args.java_version,
            working_directory: args.working_directory,
            cache_java: args.cache_java,
            proxy_port: args.proxy_port,
            read_only: args.read_only,
            gradle_home: args.gradle_home,
            enable_build_cache: args.enable_build_cache,
            proxy_no_git: args.proxy_no_git,
            proxy_no_platform: args.proxy_no_platform,
            verbose: args.cache_verbose,
        }
    }
}

/// Arguments for the save command
#[derive(Parser, Debug, Default)]
pub struct SaveArgs {
    /// Cache workspace (defaults to the one restore used)
    #[arg(long, env = "INPUT_WORKSPACE")]
    pub workspace: Option<String>,

    /// Save the Java installation ("false" skips it even if restore cached it)
    #[arg(long, env = "INPUT_CACHE-JAVA")]
    pub cache_java: Option<String>,

    /// Verbose cache CLI output (defaults to the restore setting)
    #[arg(long = "cache-verbose", env = "INPUT_VERBOSE")]
    pub cache_verbose: Option<String>,

    /// Pattern excluded from saved archives
    #[arg(long, env = "INPUT_EXCLUDE")]
    pub exclude: Option<String>,
}

impl From<SaveArgs> for SaveInputs {
    fn from(args: SaveArgs) -> Self {
        Self {
            workspace: args.workspace,
            cache_java: args.cache_java,
            verbose: args.cache_verbose,
            exclude: args.exclude,
        }
    }
}
