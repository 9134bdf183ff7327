//! CLI command implementations.

pub mod ingest;
pub mod leave;
pub mod serve;

use std::sync::Arc;
use teleingest::agent::StaticResolver;
use teleingest::config::ClientConfig;
use teleingest::manager::conflict::InterceptRoster;
use teleingest::manager::IngestSessionManager;
use teleingest::podaccess::LogOnlyTracker;
use teleingest::{Error, Result};

/// Build the in-process session manager from the client configuration.
///
/// The resolver is backed by the configured cluster manifest; pod access is
/// tracked log-only, since no mount transport is wired into the CLI.
pub fn build_manager(config: &ClientConfig) -> Result<Arc<IngestSessionManager>> {
    let manifest = config.cluster.manifest.as_deref().ok_or_else(|| {
        Error::config(
            "load",
            "no cluster manifest configured; set manifest under [cluster] in the config file",
        )
    })?;
    let resolver = StaticResolver::from_file(manifest, config.environment.excluded.clone())?;
    Ok(Arc::new(IngestSessionManager::new(
        Arc::new(resolver),
        Arc::new(LogOnlyTracker),
        Arc::new(InterceptRoster::new()),
    )))
}
