pub mod handlers;
pub mod routes;

use anyhow::Result;
use axum::http::{header::CONTENT_TYPE, Method};
use axum::Router;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::database::Database;
use routes::create_router;

pub struct AppState {
    pub db: Database,
}

/// Router with shared state and a CORS policy open to every origin.
pub fn app(db: Database) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    create_router(Arc::new(AppState { db })).layer(cors)
}

/// Serves until Ctrl-C, then releases the store's pool.
pub async fn serve(db: Database, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = app(db.clone());

    info!("Server running on http://localhost:{}", port);

    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, closing store");
    db.close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
