//! Configuration management via environment variables
//!
//! Provides helper functions for reading environment variables with fallback
//! to deprecated variable names, the polling interval, and the provider list
//! (`CHECK_GROUPS` + `CHECK_<ID>_*`).

use crate::types::{mask_key, ProviderConfig, ProviderType};
use std::collections::HashSet;
use std::time::Duration;

/// ポーリング間隔のデフォルト（秒）
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
/// ポーリング間隔の下限（秒）
const MIN_POLL_INTERVAL_SECS: u64 = 15;
/// ポーリング間隔の上限（秒）
const MAX_POLL_INTERVAL_SECS: u64 = 600;

/// Get an environment variable with fallback to a deprecated name
///
/// If the new variable name is set, returns its value.
/// If only the old (deprecated) variable name is set, returns its value
/// and logs a deprecation warning.
///
/// # Example
/// ```
/// use checkcx::config::get_env_with_fallback;
///
/// let port = get_env_with_fallback("CHECK_PORT", "PORT");
/// ```
pub fn get_env_with_fallback(new_name: &str, old_name: &str) -> Option<String> {
    if let Ok(val) = std::env::var(new_name) {
        return Some(val);
    }
    if let Ok(val) = std::env::var(old_name) {
        tracing::warn!(
            "Environment variable '{}' is deprecated, use '{}' instead",
            old_name,
            new_name
        );
        return Some(val);
    }
    None
}

/// Get an environment variable with fallback and default value
pub fn get_env_with_fallback_or(new_name: &str, old_name: &str, default: &str) -> String {
    get_env_with_fallback(new_name, old_name).unwrap_or_else(|| default.to_string())
}

/// Get an environment variable with fallback, parsing to a specific type
///
/// Returns `default` if neither variable is set or parsing fails.
pub fn get_env_with_fallback_parse<T: std::str::FromStr>(
    new_name: &str,
    old_name: &str,
    default: T,
) -> T {
    get_env_with_fallback(new_name, old_name)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Polling configuration (dashboard refresh cadence)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    /// Minimum time between two probes of the same provider set.
    pub interval: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self::from_secs(DEFAULT_POLL_INTERVAL_SECS)
    }
}

impl PollingConfig {
    /// 秒数から構築（15〜600秒に丸める）
    pub fn from_secs(secs: u64) -> Self {
        Self {
            interval: Duration::from_secs(secs.clamp(MIN_POLL_INTERVAL_SECS, MAX_POLL_INTERVAL_SECS)),
        }
    }

    /// Load polling configuration from environment variables.
    pub fn from_env() -> Self {
        let secs = get_env_with_fallback_parse(
            "CHECK_POLL_INTERVAL_SECS",
            "CHECK_POLL_INTERVAL",
            DEFAULT_POLL_INTERVAL_SECS,
        );
        Self::from_secs(secs)
    }

    /// ミリ秒
    pub fn interval_ms(&self) -> u64 {
        self.interval.as_millis() as u64
    }

    /// 表示用ラベル（"30 seconds", "1 minute", "5 minutes"）
    pub fn label(&self) -> String {
        let secs = self.interval.as_secs();
        if secs % 60 == 0 {
            let minutes = secs / 60;
            if minutes == 1 {
                "1 minute".to_string()
            } else {
                format!("{} minutes", minutes)
            }
        } else {
            format!("{} seconds", secs)
        }
    }
}

/// 環境変数からプロバイダ設定一覧を読み込む
///
/// `CHECK_GROUPS=main,backup` のように順序付きIDを列挙し、各IDについて
/// `CHECK_<ID>_TYPE` / `_KEY` / `_MODEL`（必須）と `_ENDPOINT` / `_NAME`（任意）を読む。
pub fn load_provider_configs() -> Vec<ProviderConfig> {
    provider_configs_from(|name| std::env::var(name).ok())
}

/// 任意のルックアップ関数からプロバイダ設定一覧を構築する
///
/// 必須項目が欠けたプロバイダはスキップし、欠けている項目をwarnで出力する。
pub fn provider_configs_from<F>(lookup: F) -> Vec<ProviderConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let groups = lookup("CHECK_GROUPS").unwrap_or_default();
    let mut seen = HashSet::new();
    let mut configs = Vec::new();

    for group_id in groups.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !seen.insert(group_id.to_string()) {
            tracing::warn!(provider_id = %group_id, "Duplicate provider id in CHECK_GROUPS, skipping");
            continue;
        }

        let upper_id = group_id.to_uppercase();
        let read = |suffix: &str| {
            lookup(&format!("CHECK_{}_{}", upper_id, suffix))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let raw_type = read("TYPE");
        let provider_type = raw_type.as_deref().and_then(|t| t.parse::<ProviderType>().ok());
        let credential = read("KEY");
        let model = read("MODEL");

        let (Some(provider_type), Some(credential), Some(model)) =
            (provider_type, credential.clone(), model.clone())
        else {
            let mut missing = Vec::new();
            if provider_type.is_none() {
                missing.push("TYPE");
            }
            if credential.is_none() {
                missing.push("KEY");
            }
            if model.is_none() {
                missing.push("MODEL");
            }
            tracing::warn!(
                provider_id = %group_id,
                missing = %missing.join("/"),
                provider_type = ?raw_type,
                key = %mask_key(credential.as_deref()),
                model = ?model,
                "Skipping provider with incomplete configuration"
            );
            continue;
        };

        let endpoint = read("ENDPOINT").unwrap_or_else(|| provider_type.default_endpoint().to_string());
        let name = read("NAME").unwrap_or_else(|| group_id.to_string());

        configs.push(ProviderConfig {
            id: group_id.to_string(),
            name,
            provider_type,
            endpoint,
            model,
            credential,
        });
    }

    configs
}
