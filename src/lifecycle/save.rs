//! Save phase: runs once at the end of a job, possibly after a failure

use super::Collaborators;
use crate::cache::{runtime_tag, Transfer};
use crate::config::inputs::{self, SaveInputs};
use crate::config::Environment;
use crate::error::JvmCacheResult;
use crate::orchestration::ProxyControl;
use crate::project::BuildTool;
use crate::session::SessionState;
use std::path::Path;
use tracing::{info, warn};

/// What a save run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Pid of the proxy that was stopped
    pub stopped_proxy: Option<u32>,
    /// Tags uploaded, in order
    pub saved_tags: Vec<String>,
}

/// Run the save phase from whatever state restore left behind.
///
/// Missing state disables the steps that need it rather than failing.
pub async fn save(
    c: Collaborators<'_>,
    inputs: &SaveInputs,
    env: &Environment,
) -> JvmCacheResult<SaveReport> {
    let state = SessionState::load(c.host);
    let stopped_proxy = stop_recorded_proxy(c.proxy, &state).await?;
    let saved_tags = upload(c, &state, inputs, env).await?;
    Ok(SaveReport {
        stopped_proxy,
        saved_tags,
    })
}

/// Stop the proxy restore recorded, if any.
///
/// Needs nothing but the pid, so callers run it before anything that
/// depends on configuration.
pub async fn stop_recorded_proxy(
    proxy: &dyn ProxyControl,
    state: &SessionState,
) -> JvmCacheResult<Option<u32>> {
    let Some(pid) = state.proxy_pid else {
        return Ok(None);
    };
    proxy.stop(pid).await?;
    info!("Build cache proxy (pid {}) stopped", pid);
    Ok(Some(pid))
}

/// Upload the archives recorded in `state`, returning the tags saved
pub async fn upload(
    c: Collaborators<'_>,
    state: &SessionState,
    inputs: &SaveInputs,
    env: &Environment,
) -> JvmCacheResult<Vec<String>> {
    let mut saved_tags = Vec::new();

    let workspace = match inputs::value(&inputs.workspace) {
        Some(explicit) => Some(inputs::resolve_workspace(Some(explicit), env)?),
        None => state.workspace.clone(),
    };
    let cache_runtime = inputs::parse_bool(inputs::value(&inputs.cache_java), true)
        && state.runtime_cache_enabled();
    let verbose = match inputs::value(&inputs.verbose) {
        Some(v) => inputs::parse_bool(Some(v), false),
        None => state.verbose(),
    };
    let exclude = inputs::value(&inputs.exclude);

    let Some(workspace) = workspace else {
        info!("No workspace found, skipping save");
        return Ok(saved_tags);
    };

    info!("Saving to BoringCache...");

    let upload = |tag: String, path: &Path| {
        let args = Transfer {
            workspace: &workspace,
            tag: &tag,
            path,
            verbose,
            exclude,
        }
        .save_args();
        (tag, args)
    };

    if let (true, Some(version), Some(prefix)) = (
        cache_runtime,
        state.runtime_version.as_deref(),
        state.cache_tag_prefix.as_deref(),
    ) {
        let data_dir = c.toolchain.data_dir();
        let (tag, args) = upload(runtime_tag(prefix, version), &data_dir);
        info!("Saving Java installation [{}]...", tag);
        exec_save(c, &tag, &args).await?;
        saved_tags.push(tag);
    }

    if let (BuildTool::Maven, Some(maven_tag)) = (state.build_tool(), state.maven_tag.as_deref()) {
        let repo = env.maven_local_repo()?;
        let (tag, args) = upload(maven_tag.to_string(), &repo);
        info!("Saving Maven dependencies [{}]...", tag);
        exec_save(c, &tag, &args).await?;
        saved_tags.push(tag);
    }

    info!("Save complete");
    Ok(saved_tags)
}

async fn exec_save(c: Collaborators<'_>, tag: &str, args: &[String]) -> JvmCacheResult<()> {
    let output = c.cache.exec(args).await?;
    if output.exit_code != 0 {
        warn!("Saving {} exited with code {}", tag, output.exit_code);
    }
    Ok(())
}
