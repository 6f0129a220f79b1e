use std::sync::Arc;

use tracing::{error, info};

use todo_backend::api::router;
use todo_backend::config::ServerConfig;
use todo_backend::db::{self, SqliteTodoStore};
use todo_backend::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    todo_backend::init_tracing("todo_backend=debug,tower_http=info");

    let config = ServerConfig::new_from_env()?;

    let pool = db::connect(&config.database_url, config.max_connections)
        .await
        .inspect_err(|e| error!("failed to start server: {}", e))?;

    let state = AppState::new(Arc::new(SqliteTodoStore::new(pool.clone())));
    let app = router(state);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API server running on http://{}", addr);
    info!("health check: http://{}/healthz", addr);
    info!("readiness check: http://{}/readyz", addr);

    // Returns once the listener is closed and in-flight requests are done.
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server closed");

    pool.close().await;
    info!("database disconnected");

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutting down gracefully...");
}
