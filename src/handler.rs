use std::sync::Arc;

use axum::{Json, response::IntoResponse};
use tracing::info;

use crate::catalog::Catalog;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(serde_json::json!({"status": "ok"}))
}
