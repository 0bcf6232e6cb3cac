//! Server lifecycle: bind → spawn background task → return handle with
//! shutdown channel.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::core_state::CoreState;
use crate::web::router::web_router;

/// Handle to a running web server.
pub struct WebServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl WebServer {
    /// Signal graceful shutdown. In-flight requests are allowed to finish.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("Web server shutdown signal sent");
        }
    }

    /// Signal shutdown and wait for the server task to end.
    pub async fn stop(mut self) {
        self.shutdown();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!("Web server task failed: {e}");
            }
        }
    }
}

/// Bind `addr` and serve the application in a background task.
///
/// Port 0 picks an ephemeral port; the bound address is in the handle.
pub async fn start_server_on(
    core: Arc<CoreState>,
    addr: SocketAddr,
) -> Result<WebServer, std::io::Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let addr = listener.local_addr()?;

    let app = web_router(core);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("Web server received shutdown signal");
        };

        tracing::info!(%addr, "Web server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("Web server error: {e}");
        }

        tracing::info!("Web server stopped");
    });

    Ok(WebServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    })
}
