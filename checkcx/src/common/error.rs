//! エラー型定義
//!
//! 統一エラー型（thiserror使用）
//!
//! プローブ単体の失敗はバッチ全体を失敗させない。`CxError`は
//! 失敗した`CheckResult`のメッセージに変換されるか、ストレージ層で
//! ログに記録されて空の結果として扱われる。

use thiserror::Error;

/// check-cx error type
#[derive(Debug, Error)]
pub enum CxError {
    /// Provider configuration is incomplete or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network level failure (DNS, connection refused, TLS, ...)
    #[error("{0}")]
    Transport(String),

    /// Probe exceeded its deadline
    #[error("Request timed out")]
    Timeout,

    /// Non-2xx response from a provider
    #[error("HTTP {status}: {message}")]
    Protocol {
        /// HTTP status code
        status: u16,
        /// Message extracted from the error body
        message: String,
    },

    /// Durable history store unavailable
    #[error("Storage error: {0}")]
    Storage(String),

    /// No adapter is registered for the provider type
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// A probe request could not be constructed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for CxError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        // URLにはクエリ経由の認証キーが含まれうるため落とす
        Self::Transport(describe_error_chain(&err.without_url()))
    }
}

/// エラー本体の表示に、最も内側の原因（接続拒否やDNS失敗など）を付け加える
pub fn describe_error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let message = err.to_string();
    let mut innermost = None;
    let mut source = err.source();
    while let Some(cause) = source {
        innermost = Some(cause);
        source = cause.source();
    }

    match innermost.map(|cause| cause.to_string()) {
        Some(cause) if !cause.is_empty() && !message.contains(&cause) => {
            format!("{}: {}", message, cause)
        }
        _ => message,
    }
}

impl From<sqlx::Error> for CxError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for CxError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Storage(format!("migration failed: {}", err))
    }
}

/// check-cx result alias
pub type CxResult<T> = Result<T, CxError>;
