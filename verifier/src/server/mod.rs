pub mod error;
pub mod route;
pub mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::core::config::Config;
use crate::error::{VerifierError, VerifierResult};
use crate::server::route::server_router;
use crate::types::params::ServerParams;

pub use error::VerifyRouteError;

/// Handle for managing the HTTP server lifecycle.
pub struct ServerHandle {
    shutdown_token: CancellationToken,
    task_handle: JoinHandle<()>,
}

impl ServerHandle {
    /// Stops accepting connections, lets in-flight verifications finish and
    /// returns once the server has stopped.
    pub async fn shutdown(self) -> Result<(), tokio::task::JoinError> {
        info!("Initiating server graceful shutdown");
        self.shutdown_token.cancel();
        self.task_handle.await
    }
}

/// Binds the listener and serves the routes on a separate task.
///
/// # Returns
/// * `(SocketAddr, ServerHandle)` - The bound address and handle for managing the server
pub async fn setup_server(config: Arc<Config>) -> VerifierResult<(SocketAddr, ServerHandle)> {
    let (api_server_url, listener) = get_server_url(config.server_config()).await?;

    let shutdown_token = CancellationToken::new();
    let server_token = shutdown_token.clone();

    let app = server_router(config.clone());
    let task_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(server_token.cancelled_owned()).await {
            tracing::error!(error = %e, "HTTP server stopped with an error");
        }
    });

    info!(address = %api_server_url, "Verification server listening");
    let handle = ServerHandle { shutdown_token, task_handle };

    Ok((api_server_url, handle))
}

pub(crate) async fn get_server_url(
    server_params: &ServerParams,
) -> VerifierResult<(SocketAddr, tokio::net::TcpListener)> {
    // Tests bind port 0 so the OS picks a free one.
    let port = if cfg!(test) { 0 } else { server_params.port };

    let address = format!("{}:{}", server_params.host, port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| VerifierError::ConfigError(format!("Failed to bind {}: {}", address, e)))?;
    let api_server_url = listener.local_addr()?;

    Ok((api_server_url, listener))
}
