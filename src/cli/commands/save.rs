//! Save command - end-of-job teardown and upload

use super::{proxy_for, select_host, Services, SessionMode};
use crate::cli::args::SaveArgs;
use crate::config::{Config, ConfigManager, Environment, SaveInputs};
use crate::lifecycle::{self, save, Collaborators, FailurePolicy, PhaseOutcome};
use crate::session::SessionState;
use std::path::Path;

/// Execute the save command. Errors are reported as warnings only.
pub async fn execute(
    args: SaveArgs,
    config_manager: &ConfigManager,
    state_file: Option<&Path>,
) -> PhaseOutcome {
    let inputs = SaveInputs::from(args);
    let env = Environment::from_process();

    let host = match select_host(state_file, SessionMode::Resume).await {
        Ok(host) => host,
        Err(e) => return lifecycle::report_unhosted("Save", FailurePolicy::Warn, &e),
    };

    lifecycle::run_phase("Save", FailurePolicy::Warn, host.as_ref(), async {
        let state = SessionState::load(host.as_ref());

        // The proxy goes down even when the config file is broken
        let stopper = proxy_for(&Config::default(), &env);
        save::stop_recorded_proxy(&stopper, &state).await?;

        let config = config_manager.load().await?;
        let services = Services::new(&config, &env)?;
        let collaborators = Collaborators {
            host: host.as_ref(),
            cache: &services.cache,
            proxy: &services.proxy,
            toolchain: &services.toolchain,
        };
        save::upload(collaborators, &state, &inputs, &env).await
    })
    .await
}
