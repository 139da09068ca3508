//! データベースアクセス層
//!
//! SQLiteベースのチェック履歴永続化

use crate::common::error::CxResult;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// チェック履歴ストア
pub mod check_history;

/// デフォルトのデータベースURL
pub const DEFAULT_DATABASE_URL: &str = "sqlite:data/check-cx.db";

/// SQLiteプールを作成し、マイグレーションを実行する
pub async fn init_pool(database_url: &str) -> CxResult<SqlitePool> {
    // SQLiteファイルはディレクトリが存在しないと作成できないため、先に作成しておく
    if let Some(path) = database_url.strip_prefix("sqlite:") {
        // `sqlite::memory:` のような特殊指定はスキップ
        if !path.starts_with(':') {
            let normalized = path.trim_start_matches("//");
            let path_without_params = normalized.split('?').next().unwrap_or(normalized);
            let db_path = std::path::Path::new(path_without_params);
            if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| {
                    crate::common::error::CxError::Storage(format!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }
    }

    let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    // インメモリDBは接続ごとに別DBになるため、1接続を閉じずに使い続ける
    let pool_options = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };
    let pool = pool_options.connect_with(connect_options).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}
