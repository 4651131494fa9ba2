//! API server lifecycle.
//!
//! Two ways to run the router: `run` serves in the foreground until
//! Ctrl-C (the main binary uses this), `start_server` binds and spawns
//! a background task, returning a handle with a shutdown channel
//! (tests and embedders use this).

use std::net::SocketAddr;

use tokio::sync::oneshot;

use crate::api::router::api_router;
use crate::api::types::ApiContext;

/// Handle to a server running in a background task.
pub struct ApiServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ApiServer {
    /// Shut down the server gracefully. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }
}

/// Serve the API in the foreground until Ctrl-C.
pub async fn run(ctx: ApiContext, addr: SocketAddr) -> Result<(), String> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind API server on {addr}: {e}"))?;
    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    tracing::info!(%addr, "API server listening");

    axum::serve(listener, api_router(ctx))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("API server error: {e}"))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!("Cannot install shutdown handler: {e}");
            // Without a handler, keep serving instead of exiting early.
            std::future::pending::<()>().await;
        }
    }
}

/// Bind and spawn the server in a background tokio task.
pub async fn start_server(ctx: ApiContext, addr: SocketAddr) -> Result<ApiServer, String> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind API server on {addr}: {e}"))?;
    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    let app = api_router(ctx);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_ctx() -> (ApiContext, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = ApiContext::new(tmp.path().join("server-test.db"));
        (ctx, tmp)
    }

    fn loopback() -> SocketAddr {
        "127.0.0.1:0".parse().unwrap()
    }

    #[tokio::test]
    async fn start_and_stop_server() {
        let (ctx, _tmp) = test_ctx();
        let mut server = start_server(ctx, loopback())
            .await
            .expect("server should start");

        assert!(server.addr.port() > 0);

        let url = format!("http://{}/status", server.addr);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["success"], true);

        server.shutdown();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn requests_share_one_database() {
        let (ctx, _tmp) = test_ctx();
        let mut server = start_server(ctx, loopback())
            .await
            .expect("server should start");
        let base = format!("http://{}", server.addr);
        let client = reqwest::Client::new();

        // Each request opens its own connection to the same file.
        let resp = client
            .post(format!("{base}/clients"))
            .json(&serde_json::json!({
                "first_name": "Amina",
                "last_name": "Diallo",
                "date_of_birth": "1988-04-12",
                "gender": "female"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::CREATED);

        let resp = client.get(format!("{base}/clients")).send().await.unwrap();
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["data"].as_array().unwrap().len(), 1);

        server.shutdown();
    }

    #[tokio::test]
    async fn unknown_route_returns_not_found() {
        let (ctx, _tmp) = test_ctx();
        let mut server = start_server(ctx, loopback())
            .await
            .expect("server should start");

        let url = format!("http://{}/nonexistent", server.addr);
        let resp = reqwest::get(&url).await.unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        server.shutdown();
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let (ctx, _tmp) = test_ctx();
        let mut server = start_server(ctx, loopback())
            .await
            .expect("server should start");

        server.shutdown();
        server.shutdown();
    }
}
