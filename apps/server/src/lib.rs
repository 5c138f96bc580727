//! # Wedding RSVP Server
//!
//! Serves the RSVP form endpoint, the confirmation sweep and the health probe over `Axum`,
//! backed by `SurrealDB`.
//!
//! ## Example
//! ```no_run
//! use wed_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Server::builder()
//!         .port(4583)
//!         .build()
//!         .await?
//!         .run()
//!         .await
//! }
//! ```

mod router;

use anyhow::{Context, Result};
use axum::Router;
use axum_server::Handle;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use wed::bootstrap;
use wed::domain::config::ApiConfig;
use wed::kernel::server::{ApiState, health};
use wed::kernel::store::SurrealStore;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct ServerBuilder {
    cfg: ApiConfig,
}

impl ServerBuilder {
    pub fn config(mut self, cfg: ApiConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.cfg.server.port = port;
        self
    }

    fn validate_ssl_config(&self) -> Result<()> {
        let Some(ssl) = &self.cfg.server.ssl else {
            return Ok(());
        };
        if !ssl.cert.exists() {
            anyhow::bail!("SSL certificate not found at: {}", ssl.cert.display());
        }
        if !ssl.key.exists() {
            anyhow::bail!("SSL key not found at: {}", ssl.key.display());
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if ssl.key.metadata()?.permissions().mode() & 0o077 != 0 {
                warn!(key = %ssl.key.display(), "SSL private key is readable by group or others");
            }
        }
        Ok(())
    }

    /// Connects the database, seeds the registry when it is absent, and registers the RSVP and
    /// confirmation slices.
    ///
    /// # Errors
    /// Fails when the SSL files are missing, the database is unreachable, the registry seed
    /// cannot be written, or the state registry rejects a slice.
    pub async fn build(self) -> Result<Server> {
        self.validate_ssl_config()?;

        let address = SocketAddr::new(self.cfg.server.address, self.cfg.server.port);
        info!(%address, "Initializing server");

        let db = bootstrap::connect(&self.cfg.database).await?;

        let store = SurrealStore::new(db.clone());
        bootstrap::seed_registry(&store, self.cfg.registry.as_ref()).await?;

        let slices = wed::init(&self.cfg, &db);
        let state = ApiState::builder()
            .config(self.cfg)
            .db(db)
            .register_slices(slices)
            .build()
            .context("Failed to finalize API state registry")?;

        Ok(Server { state })
    }
}

#[must_use = "call .run().await to start the server"]
#[derive(Debug)]
pub struct Server {
    state: ApiState,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// The complete HTTP application: feature routes, system routes and the API reference.
    pub fn app(&self) -> Router {
        router::init(self.state.clone())
    }

    /// Serves until SIGINT or SIGTERM, then drains connections for up to 30 seconds.
    ///
    /// # Errors
    /// Fails when binding the address or loading the TLS material fails.
    pub async fn run(self) -> Result<()> {
        let cfg = self.state.config.clone();
        let address = SocketAddr::new(cfg.server.address, cfg.server.port);
        let app = self.app();

        let handle = Handle::<SocketAddr>::new();
        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            if let Err(e) = shutdown_signal().await {
                error!("Error while waiting for shutdown signal: {e}");
                return;
            }
            info!("Shutdown signal received, starting graceful shutdown");
            shutdown_handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        });

        health::mark_started();

        if let Some(ssl) = &cfg.server.ssl {
            info!("Starting HTTPS server on https://{address}");
            let tls = axum_server::tls_rustls::RustlsConfig::from_pem_file(&ssl.cert, &ssl.key)
                .await
                .context("Failed to load SSL/TLS certificates")?;

            axum_server::bind_rustls(address, tls)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .context("HTTPS server failed")?;
        } else {
            info!("Starting HTTP server on http://{address}");
            axum_server::bind(address)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .context("HTTP server failed")?;
        }

        info!("Server shutdown complete");
        Ok(())
    }

    #[must_use]
    pub const fn state(&self) -> &ApiState {
        &self.state
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => res?,
        res = terminate => res?,
    }
    Ok(())
}
