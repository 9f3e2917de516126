//! Restore phase: runs once at the start of a job

use super::Collaborators;
use crate::buildconf;
use crate::cache::{maven_deps_tag, runtime_tag, Transfer};
use crate::config::inputs::{self, RestoreInputs};
use crate::config::schema::ProxyConfig;
use crate::config::Environment;
use crate::error::{JvmCacheError, JvmCacheResult};
use crate::orchestration::{ProxyHandle, ProxySettings};
use crate::project::{detect_build_tool, resolve_runtime_version, BuildTool};
use crate::session::{SessionRecorder, SessionSetup};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// What a restore run established
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub workspace: String,
    pub cache_tag_prefix: String,
    pub runtime_version: String,
    pub build_tool: BuildTool,
    pub runtime_cache_hit: bool,
    pub proxy: Option<ProxyHandle>,
    pub maven_restored: Option<bool>,
}

/// Resolved restore settings
struct Plan {
    workspace: String,
    cache_tag_prefix: String,
    runtime_version: String,
    working_dir: PathBuf,
    build_tool: BuildTool,
    cache_runtime: bool,
    proxy_port: Option<u16>,
    read_only: bool,
    enable_build_cache: bool,
    proxy_no_git: bool,
    proxy_no_platform: bool,
    verbose: bool,
}

impl Plan {
    fn resolve(inputs: &RestoreInputs, env: &Environment) -> JvmCacheResult<Self> {
        let workspace = inputs::resolve_workspace(inputs::value(&inputs.workspace), env)?;
        let cache_tag_prefix =
            inputs::resolve_cache_tag_prefix(inputs::value(&inputs.cache_tag), env);
        let working_dir = resolve_working_dir(inputs::value(&inputs.working_directory))?;
        let runtime_version =
            resolve_runtime_version(inputs::value(&inputs.java_version), &working_dir);
        let build_tool = detect_build_tool(&working_dir);

        let proxy_port = inputs::parse_port(inputs::value(&inputs.proxy_port));
        if let (None, Some(raw)) = (proxy_port, inputs::value(&inputs.proxy_port)) {
            warn!("Ignoring proxy-port {:?}, selecting a free port", raw);
        }

        Ok(Self {
            workspace,
            cache_tag_prefix,
            runtime_version,
            working_dir,
            build_tool,
            cache_runtime: inputs::parse_bool(inputs::value(&inputs.cache_java), true),
            proxy_port,
            read_only: inputs::parse_bool(inputs::value(&inputs.read_only), false),
            enable_build_cache: inputs::parse_bool(
                inputs::value(&inputs.enable_build_cache),
                true,
            ),
            proxy_no_git: inputs::parse_bool(inputs::value(&inputs.proxy_no_git), false),
            proxy_no_platform: inputs::parse_bool(inputs::value(&inputs.proxy_no_platform), false),
            verbose: inputs::parse_bool(inputs::value(&inputs.verbose), false),
        })
    }

    fn setup(&self) -> SessionSetup<'_> {
        SessionSetup {
            workspace: &self.workspace,
            cache_tag_prefix: &self.cache_tag_prefix,
            runtime_version: &self.runtime_version,
            working_dir: &self.working_dir,
            cache_runtime: self.cache_runtime,
            build_tool: self.build_tool,
            verbose: self.verbose,
        }
    }

    fn transfer<'a>(&'a self, tag: &'a str, path: &'a Path) -> Transfer<'a> {
        Transfer {
            workspace: &self.workspace,
            tag,
            path,
            verbose: self.verbose,
            exclude: None,
        }
    }
}

fn resolve_working_dir(input: Option<&str>) -> JvmCacheResult<PathBuf> {
    match input {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => std::env::current_dir()
            .map_err(|e| JvmCacheError::io("getting current directory", e)),
    }
}

/// Run the restore phase. Any error aborts the remaining steps.
pub async fn restore(
    c: Collaborators<'_>,
    inputs: &RestoreInputs,
    env: &Environment,
    proxy_config: &ProxyConfig,
) -> JvmCacheResult<RestoreReport> {
    let plan = Plan::resolve(inputs, env)?;
    let recorder = SessionRecorder::new(c.host);
    recorder.setup(&plan.setup()).await?;

    let cli_version = inputs::value(&inputs.cli_version);
    if inputs::is_skip(cli_version) {
        info!("Skipping cache CLI installation");
    } else {
        c.cache.ensure(cli_version).await?;
    }

    let runtime_cache_hit = if plan.cache_runtime {
        let hit = restore_runtime(c, &plan).await?;
        c.host.set_output("java-cache-hit", bool_str(hit)).await?;
        hit
    } else {
        false
    };

    c.toolchain.install_runtime().await?;
    for dir in c.toolchain.path_entries() {
        c.host.add_path(&dir).await?;
    }

    if runtime_cache_hit {
        c.toolchain.activate_version(&plan.runtime_version).await?;
    } else {
        c.toolchain.install_version(&plan.runtime_version).await?;
    }

    let proxy = if plan.build_tool.uses_proxy() {
        Some(start_proxy(c, &plan, &recorder, proxy_config).await?)
    } else {
        None
    };

    let mut maven_restored = None;
    if let Some(handle) = proxy {
        match plan.build_tool {
            BuildTool::Gradle => {
                configure_gradle(inputs, env, &plan, &proxy_config.host, handle.port).await?
            }
            BuildTool::Maven => {
                configure_maven(&plan, &proxy_config.host, handle.port).await?;
                maven_restored = Some(restore_maven_deps(c, env, &plan, &recorder).await?);
            }
            BuildTool::None => {}
        }
    }

    c.host.set_output("workspace", &plan.workspace).await?;
    c.host
        .set_output("java-version", &plan.runtime_version)
        .await?;
    c.host
        .set_output("cache-tag", &plan.cache_tag_prefix)
        .await?;
    c.host
        .set_output("cache-hit", bool_str(runtime_cache_hit))
        .await?;

    info!(
        "Java {} setup complete (build tool: {})",
        plan.runtime_version, plan.build_tool
    );

    Ok(RestoreReport {
        workspace: plan.workspace,
        cache_tag_prefix: plan.cache_tag_prefix,
        runtime_version: plan.runtime_version,
        build_tool: plan.build_tool,
        runtime_cache_hit,
        proxy,
        maven_restored,
    })
}

async fn restore_runtime(c: Collaborators<'_>, plan: &Plan) -> JvmCacheResult<bool> {
    info!("Restoring Java {}...", plan.runtime_version);
    let tag = runtime_tag(&plan.cache_tag_prefix, &plan.runtime_version);
    let data_dir = c.toolchain.data_dir();

    let output = c.cache.exec(&plan.transfer(&tag, &data_dir).restore_args()).await?;
    Ok(output.is_hit())
}

/// Start the proxy and wait for it. The pid is recorded before waiting so a
/// proxy that never becomes ready is still stopped by save.
async fn start_proxy(
    c: Collaborators<'_>,
    plan: &Plan,
    recorder: &SessionRecorder<'_>,
    proxy_config: &ProxyConfig,
) -> JvmCacheResult<ProxyHandle> {
    let port = match plan.proxy_port {
        Some(port) => port,
        None => c.proxy.free_port().await?,
    };

    let settings = ProxySettings {
        workspace: plan.workspace.clone(),
        tag: plan.cache_tag_prefix.clone(),
        host: proxy_config.host.clone(),
        port,
        no_git: plan.proxy_no_git,
        no_platform: plan.proxy_no_platform,
        verbose: plan.verbose,
    };

    let handle = c.proxy.start(&settings).await?;
    recorder.proxy_pid(handle.pid).await?;

    c.proxy
        .wait_ready(handle.port, proxy_config.ready_timeout(), handle.pid)
        .await?;

    c.host
        .set_output("proxy-port", &handle.port.to_string())
        .await?;
    Ok(handle)
}

async fn configure_gradle(
    inputs: &RestoreInputs,
    env: &Environment,
    plan: &Plan,
    host: &str,
    port: u16,
) -> JvmCacheResult<()> {
    let gradle_home = inputs::resolve_gradle_home(inputs::value(&inputs.gradle_home), env.home()?)?;

    buildconf::write_gradle_init_script(&gradle_home, host, port, plan.read_only).await?;
    if plan.enable_build_cache {
        buildconf::enable_gradle_build_cache(&gradle_home).await?;
    }

    info!("Gradle build cache configured at http://{}:{}/cache/", host, port);
    Ok(())
}

async fn configure_maven(plan: &Plan, host: &str, port: u16) -> JvmCacheResult<()> {
    buildconf::ensure_maven_extension(&plan.working_dir).await?;
    buildconf::write_maven_cache_config(&plan.working_dir, host, port, plan.read_only).await?;

    info!("Maven build cache configured at http://{}:{}/", host, port);
    Ok(())
}

async fn restore_maven_deps(
    c: Collaborators<'_>,
    env: &Environment,
    plan: &Plan,
    recorder: &SessionRecorder<'_>,
) -> JvmCacheResult<bool> {
    let repo = env.maven_local_repo()?;
    let tag = maven_deps_tag(&plan.cache_tag_prefix);

    info!("Restoring Maven dependencies...");
    let output = c.cache.exec(&plan.transfer(&tag, &repo).restore_args()).await?;
    let restored = output.is_hit();

    recorder.maven(&tag, restored).await?;
    if restored {
        info!("Maven dependencies restored");
    } else {
        info!("Maven dependencies not in cache");
    }
    Ok(restored)
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
