//! ダッシュボードAPIハンドラー
//!
//! `GET /api/dashboard?refresh=always|missing|never`

use super::error::AppError;
use crate::common::error::CxError;
use crate::dashboard::{DashboardData, RefreshMode};
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

/// クエリパラメータ
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// プローブ方針（省略時は`missing`）
    pub refresh: Option<String>,
}

/// GET /api/dashboard
///
/// ストア障害は空のタイムラインとして返る。エラーになるのは不正なクエリのみ。
pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardData>, AppError> {
    let mode = match query.refresh.as_deref() {
        None | Some("") => RefreshMode::default(),
        Some(raw) => raw.parse().map_err(CxError::InvalidRequest)?,
    };

    Ok(Json(state.dashboard.load_dashboard_data(mode).await))
}
