//! `teleingest serve` command.

use clap::Args;
use std::net::SocketAddr;
use std::sync::Arc;
use teleingest::api::{self, state::ApiState};
use teleingest::config::ClientConfig;
use teleingest::{Error, Result};

/// Start the HTTP API server for programmatic control.
#[derive(Args, Debug)]
pub struct ServeCmd {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub listen: SocketAddr,

    /// Allowed CORS origins (repeatable); defaults to localhost
    #[arg(long = "cors-origin")]
    pub cors_origins: Vec<String>,
}

impl ServeCmd {
    pub fn run(self) -> Result<()> {
        let config = ClientConfig::load()?;
        let manager = super::build_manager(&config)?;
        let router = api::create_router(
            Arc::new(ApiState::new(manager.clone())),
            self.cors_origins,
        );

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind(self.listen).await?;
            tracing::info!(listen = %self.listen, "serving ingest API");
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
            Ok::<(), Error>(())
        })?;

        // Cascading teardown of every ingest the daemon still holds.
        manager.disconnect();
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
