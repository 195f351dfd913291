//! Web servers for ozima.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::{OzimaError, Result};

use super::handlers::{FsState, StorageState};
use super::middleware::TokenState;
use super::router::{create_fs_router, create_storage_router};

/// One HTTP service bound to a configured address.
pub struct WebServer {
    /// Service name used in logs.
    name: &'static str,
    /// Server address.
    addr: SocketAddr,
    /// Fully layered router.
    router: Router,
}

fn parse_addr(host: &str, port: u16) -> Result<SocketAddr> {
    format!("{host}:{port}")
        .parse()
        .map_err(|e| OzimaError::Config(format!("invalid listen address {host}:{port}: {e}")))
}

impl WebServer {
    /// Create the storage API server.
    pub fn storage_api(config: &Config) -> Result<Self> {
        let state = Arc::new(StorageState::new(&config.storage)?);
        let token_state = Arc::new(TokenState::new(&config.auth.api_token));

        tracing::info!(
            storage = %state.storage.base_path().display(),
            chunks = %state.reassembler.chunks().base_path().display(),
            "Storage initialized"
        );

        Ok(Self {
            name: "storage API",
            addr: parse_addr(&config.storage_api.host, config.storage_api.port)?,
            router: create_storage_router(
                state,
                token_state,
                config.storage.max_upload_size_bytes(),
            ),
        })
    }

    /// Create the filesystem-ops API server.
    pub fn fs_api(config: &Config) -> Result<Self> {
        let state = Arc::new(FsState::new(&config.storage));
        let token_state = Arc::new(TokenState::new(&config.auth.api_token));

        Ok(Self {
            name: "filesystem API",
            addr: parse_addr(&config.fs_api.host, config.fs_api.port)?,
            router: create_fs_router(state, token_state),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Run the server until `shutdown` resolves.
    pub async fn run<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        tracing::info!("{} listening on http://{}", self.name, local_addr);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("{} stopped", self.name);
        Ok(())
    }

    /// Run the server in the background and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        let name = self.name;

        tracing::info!("{} listening on http://{}", name, local_addr);

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, self.router).await {
                tracing::error!("{} error: {}", name, e);
            }
        });

        Ok(local_addr)
    }
}
