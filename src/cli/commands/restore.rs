//! Restore command - start-of-job setup

use super::{select_host, Services, SessionMode};
use crate::cli::args::RestoreArgs;
use crate::config::{ConfigManager, Environment, RestoreInputs};
use crate::lifecycle::{self, Collaborators, FailurePolicy, PhaseOutcome};
use std::path::Path;

/// Execute the restore command. Every error fails the step.
pub async fn execute(
    args: RestoreArgs,
    config_manager: &ConfigManager,
    state_file: Option<&Path>,
) -> PhaseOutcome {
    let inputs = RestoreInputs::from(args);
    let env = Environment::from_process();

    let host = match select_host(state_file, SessionMode::Fresh).await {
        Ok(host) => host,
        Err(e) => return lifecycle::report_unhosted("Restore", FailurePolicy::Fail, &e),
    };

    lifecycle::run_phase("Restore", FailurePolicy::Fail, host.as_ref(), async {
        let config = config_manager.load().await?;
        let services = Services::new(&config, &env)?;
        let collaborators = Collaborators {
            host: host.as_ref(),
            cache: &services.cache,
            proxy: &services.proxy,
            toolchain: &services.toolchain,
        };
        lifecycle::restore(collaborators, &inputs, &env, &config.proxy).await
    })
    .await
}
