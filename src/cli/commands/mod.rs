//! CLI command implementations

pub mod restore;
pub mod save;

pub use restore::execute as restore;
pub use save::execute as save;

use crate::cache::BoringCacheCli;
use crate::config::{Config, ConfigManager, Environment};
use crate::error::JvmCacheResult;
use crate::host::{ActionsHost, JobHost, LocalHost};
use crate::orchestration::{MiseToolchain, RegistryProxy};
use std::path::Path;
use tracing::debug;

/// How the session state store is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionMode {
    /// Start a new session, discarding any previous local one
    Fresh,
    /// Continue the session restore left behind
    Resume,
}

/// Pick the job host: explicit state file, then the Actions runner, then
/// the default local state file
async fn select_host(
    state_file: Option<&Path>,
    mode: SessionMode,
) -> JvmCacheResult<Box<dyn JobHost>> {
    if state_file.is_none() && ActionsHost::detected() {
        debug!("Using GitHub Actions runner state");
        return Ok(Box::new(ActionsHost::from_env()));
    }

    let path = state_file
        .map(Path::to_path_buf)
        .unwrap_or_else(ConfigManager::default_state_file);
    debug!("Using local session file {}", path.display());

    let host = match mode {
        SessionMode::Fresh => LocalHost::create(path).await?,
        SessionMode::Resume => LocalHost::open(path).await?,
    };
    Ok(Box::new(host))
}

/// Concrete collaborators built from configuration
struct Services {
    cache: BoringCacheCli,
    proxy: RegistryProxy,
    toolchain: MiseToolchain,
}

impl Services {
    fn new(config: &Config, env: &Environment) -> JvmCacheResult<Self> {
        let cache = BoringCacheCli::new(&config.cache, env);
        let proxy = proxy_for(config, env);
        let toolchain = MiseToolchain::new(&config.toolchain, env)?;
        Ok(Self {
            cache,
            proxy,
            toolchain,
        })
    }
}

/// Proxy control for `config`. Building it touches neither the filesystem
/// nor the network.
fn proxy_for(config: &Config, env: &Environment) -> RegistryProxy {
    RegistryProxy::new(
        BoringCacheCli::new(&config.cache, env),
        config.proxy.host.clone(),
        config.proxy.poll_interval(),
        ConfigManager::proxy_log_dir(),
    )
}
