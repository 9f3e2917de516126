//! jvmcache - JVM toolchain and build cache lifecycle for CI
//!
//! CLI entry point that dispatches to the restore and save phases.

use clap::Parser;
use jvmcache::cli::{Cli, Commands};
use jvmcache::config::ConfigManager;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 0 = info, 1 = debug, 2+ = trace; RUST_LOG wins when set
    let default_filter = match cli.verbose {
        0 => "jvmcache=info",
        1 => "jvmcache=debug",
        _ => "jvmcache=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let state_file = cli.state_file.as_deref();

    let outcome = match cli.command {
        Commands::Restore(args) => {
            jvmcache::cli::commands::restore(args, &config_manager, state_file).await
        }
        Commands::Save(args) => {
            jvmcache::cli::commands::save(args, &config_manager, state_file).await
        }
    };

    if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
