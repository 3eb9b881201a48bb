use axum::{routing::get, Router};
use std::sync::Arc;

use super::handlers::{
    create_transfer, get_architecture, health, list_architectures, list_transfers,
};
use super::AppState;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/transfers", get(list_transfers))
        .route("/api/transfers", get(list_transfers).post(create_transfer))
        .route("/api/architectures", get(list_architectures))
        .route("/api/architectures/:id", get(get_architecture))
        .with_state(app_state)
}
