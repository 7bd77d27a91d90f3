//! Thin HTTP plumbing around the punch clock: an axum router with the JSON
//! endpoints, static file serving for the web page, and ctrl-c shutdown.

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Result;
use axum::{routing::get, Router};
use tokio::{net::TcpListener, select};
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tracing::info;

use crate::{
    server::handlers::{
        history_handler, pause_handler, start_handler, status_handler, AppState,
    },
    storage::record_store::CsvRecordStore,
    utils::clock::SystemClock,
};

pub mod handlers;

pub const DEFAULT_PORT: u16 = 8080;

/// Builds and runs the server until ctrl-c. `record_dir` holds the daily CSV
/// files, `static_dir` is served at `/` for the web page.
pub async fn start_server(port: u16, record_dir: PathBuf, static_dir: PathBuf) -> Result<()> {
    let store = CsvRecordStore::new(record_dir)?;
    let state = AppState {
        store: Arc::new(store),
        clock: Arc::new(SystemClock),
    };

    let app = router(state, &static_dir);

    let shutdown_token = CancellationToken::new();
    tokio::spawn(detect_shutdown(shutdown_token.clone()));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr).await?;
    info!("Punch clock listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_token.cancelled_owned())
        .await?;
    Ok(())
}

fn router(state: AppState, static_dir: &Path) -> Router {
    // The clock endpoints answer GET as well as POST so the bare browser
    // address bar works.
    Router::new()
        .route("/start", get(start_handler).post(start_handler))
        .route("/pause", get(pause_handler).post(pause_handler))
        .route("/status", get(status_handler))
        .route("/history", get(history_handler))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}

/// Detects signals sent to the process.
async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
    };
}
