//! プロトコルアダプタ（ProbeAdapter trait + 各プロバイダ実装）
//!
//! OpenAI chat completions、Google generateContent、Anthropic messages の
//! 最小pingリクエスト構築とエラーボディからのメッセージ抽出を
//! 共通の ProbeAdapter trait で抽象化する。

use crate::common::error::{CxError, CxResult};
use crate::types::{ProviderConfig, ProviderType};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::{json, Value};

/// エラーボディが非JSONの場合に使う先頭文字数
const RAW_BODY_PREVIEW_CHARS: usize = 280;

/// Anthropic API バージョンヘッダー値
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// プローブ用HTTPリクエスト
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    /// 実際に送信するURL（Geminiではクエリにキーを含む）
    pub url: String,
    /// 結果に表示するエンドポイント。Noneなら`url`を表示する
    pub display_endpoint: Option<String>,
    /// リクエストヘッダー
    pub headers: HeaderMap,
    /// JSONボディ
    pub body: Value,
}

impl ProbeRequest {
    /// 結果に記録するエンドポイント
    pub fn reported_endpoint(&self) -> &str {
        self.display_endpoint.as_deref().unwrap_or(&self.url)
    }
}

/// プロバイダファミリーごとのプローブ方法
pub trait ProbeAdapter: Send + Sync {
    /// 対応するプロバイダ種別
    fn provider_type(&self) -> ProviderType;

    /// 最小のpingリクエストを構築する
    fn build_request(&self, config: &ProviderConfig) -> CxResult<ProbeRequest>;

    /// エラーボディから表示用メッセージを抽出する
    fn extract_error_message(&self, body: &str) -> String {
        extract_error_message(body)
    }
}

/// プロバイダ種別に対応するアダプタを返す
pub fn adapter_for(provider_type: ProviderType) -> &'static dyn ProbeAdapter {
    match provider_type {
        ProviderType::OpenAi => &OpenAiAdapter,
        ProviderType::Gemini => &GeminiAdapter,
        ProviderType::Anthropic => &AnthropicAdapter,
    }
}

/// 素のエンドポイントにフォールバックパスを付与する
///
/// 既にパスで終わる、`/v1/`や`/deployments/`を含む、クエリ文字列を持つ、
/// のいずれかに当てはまる場合はそのまま返す。
pub fn ensure_path(endpoint: &str, fallback_path: &str) -> String {
    if endpoint.is_empty() {
        return fallback_path.to_string();
    }
    if endpoint.ends_with(fallback_path)
        || endpoint.contains("/v1/")
        || endpoint.contains("/deployments/")
        || endpoint.contains('?')
    {
        return endpoint.to_string();
    }
    format!("{}{}", endpoint.strip_suffix('/').unwrap_or(endpoint), fallback_path)
}

/// URLにクエリを追加する
pub fn append_query(url: &str, query: &str) -> String {
    if url.contains('?') {
        format!("{}&{}", url, query)
    } else {
        format!("{}?{}", url, query)
    }
}

/// 共通のエラーメッセージ抽出
///
/// JSONなら `error.message` → `error` → `message` → 全体 の順に採用し、
/// JSONでなければ先頭280文字を返す。
pub fn extract_error_message(body: &str) -> String {
    if body.trim().is_empty() {
        return String::new();
    }
    let Ok(parsed) = serde_json::from_str::<Value>(body) else {
        return body.chars().take(RAW_BODY_PREVIEW_CHARS).collect();
    };

    let non_empty_str = |v: Option<&Value>| {
        v.and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    if let Some(message) = non_empty_str(parsed.pointer("/error/message")) {
        return message;
    }
    match parsed.get("error") {
        Some(Value::String(s)) if !s.is_empty() => return s.clone(),
        Some(v @ Value::Object(_)) | Some(v @ Value::Array(_)) => return v.to_string(),
        _ => {}
    }
    if let Some(message) = non_empty_str(parsed.get("message")) {
        return message;
    }
    parsed.to_string()
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

fn secret_header(value: &str) -> CxResult<HeaderValue> {
    let mut value = HeaderValue::from_str(value)
        .map_err(|_| CxError::InvalidRequest("credential contains invalid header characters".into()))?;
    value.set_sensitive(true);
    Ok(value)
}

// ---------------------------------------------------------------------------
// OpenAI アダプタ
// ---------------------------------------------------------------------------

/// OpenAI互換 chat completions
pub struct OpenAiAdapter;

impl ProbeAdapter for OpenAiAdapter {
    fn provider_type(&self) -> ProviderType {
        ProviderType::OpenAi
    }

    fn build_request(&self, config: &ProviderConfig) -> CxResult<ProbeRequest> {
        let mut headers = json_headers();
        headers.insert(
            AUTHORIZATION,
            secret_header(&format!("Bearer {}", config.credential))?,
        );

        Ok(ProbeRequest {
            url: ensure_path(&config.endpoint, "/v1/chat/completions"),
            display_endpoint: Some(config.endpoint.clone()),
            headers,
            body: json!({
                "model": config.model,
                "messages": [
                    {"role": "system", "content": "You are a health check endpoint."},
                    {"role": "user", "content": "ping"}
                ],
                "max_tokens": 3,
                "temperature": 0
            }),
        })
    }
}

// ---------------------------------------------------------------------------
// Gemini アダプタ
// ---------------------------------------------------------------------------

/// Google Generative AI generateContent
pub struct GeminiAdapter;

impl ProbeAdapter for GeminiAdapter {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Gemini
    }

    fn build_request(&self, config: &ProviderConfig) -> CxResult<ProbeRequest> {
        let normalized = if config.endpoint.ends_with(":generateContent") {
            config.endpoint.clone()
        } else {
            format!(
                "{}/models/{}:generateContent",
                config.endpoint.trim_end_matches('/'),
                config.model
            )
        };

        // キーはヘッダーではなくクエリで渡す
        Ok(ProbeRequest {
            url: append_query(&normalized, &format!("key={}", config.credential)),
            display_endpoint: Some(config.endpoint.clone()),
            headers: json_headers(),
            body: json!({
                "contents": [{
                    "role": "user",
                    "parts": [{"text": "ping"}]
                }]
            }),
        })
    }
}

// ---------------------------------------------------------------------------
// Anthropic アダプタ
// ---------------------------------------------------------------------------

/// Anthropic messages
pub struct AnthropicAdapter;

impl ProbeAdapter for AnthropicAdapter {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Anthropic
    }

    fn build_request(&self, config: &ProviderConfig) -> CxResult<ProbeRequest> {
        let mut headers = json_headers();
        headers.insert(
            HeaderName::from_static("x-api-key"),
            secret_header(&config.credential)?,
        );
        headers.insert(
            HeaderName::from_static("anthropic-version"),
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        Ok(ProbeRequest {
            url: ensure_path(&config.endpoint, "/v1/messages"),
            display_endpoint: Some(config.endpoint.clone()),
            headers,
            body: json!({
                "model": config.model,
                "max_tokens": 10,
                "messages": [{"role": "user", "content": "ping"}]
            }),
        })
    }
}
