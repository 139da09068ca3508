//! APIエラーレスポンス型

use crate::common::error::CxError;
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

/// Axum用のエラーレスポンス型
#[derive(Debug)]
pub struct AppError(pub CxError);

impl From<CxError> for AppError {
    fn from(err: CxError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            CxError::InvalidRequest(_) | CxError::Config(_) => StatusCode::BAD_REQUEST,
            CxError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            CxError::Transport(_) | CxError::Protocol { .. } => StatusCode::BAD_GATEWAY,
            CxError::Storage(_) | CxError::UnsupportedProvider(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let payload = json!({
            "error": self.0.to_string()
        });

        (status, Json(payload)).into_response()
    }
}
