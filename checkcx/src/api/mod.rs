//! REST API
//!
//! ダッシュボードデータとプロセスの生存確認を提供する。

pub mod dashboard;
pub mod error;

use crate::AppState;
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

/// APIルーターを構築
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/dashboard", get(dashboard::get_dashboard))
        .route("/api/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
