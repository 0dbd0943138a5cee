use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tabula_http::configure_routes;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::SchemaConfig;

#[derive(Args)]
pub struct ServeCommand {
    /// Address to bind the server to
    #[arg(long, default_value = "127.0.0.1:3000", env = "TABULA_ADDRESS")]
    pub address: String,

    /// YAML file declaring the tables to serve
    #[arg(long, env = "TABULA_SCHEMA")]
    pub schema: PathBuf,
}

impl ServeCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let config = SchemaConfig::load(&self.schema)?;
        let routers = config.routers()?;
        debug!(
            "Loaded {} tables from {}",
            routers.len(),
            self.schema.display()
        );

        let app = configure_routes(routers);

        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(async move {
            let listener = TcpListener::bind(&self.address)
                .await
                .with_context(|| format!("Failed to bind {}", self.address))?;
            info!("Starting Tabula server on {}", self.address);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            info!("Server stopped");
            Ok::<(), anyhow::Error>(())
        })
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
    }
}
