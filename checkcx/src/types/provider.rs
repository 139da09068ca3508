//! プロバイダ設定型定義

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// プロバイダ種別
///
/// プロトコルファミリーごとに1バリアント。追加時は`health::adapters`に
/// アダプタを1つ追加する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// OpenAI互換 chat completions
    OpenAi,
    /// Google Gemini generateContent
    Gemini,
    /// Anthropic messages
    Anthropic,
}

impl ProviderType {
    /// 全バリアント
    pub const ALL: [ProviderType; 3] = [Self::OpenAi, Self::Gemini, Self::Anthropic];

    /// 文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
            Self::Anthropic => "anthropic",
        }
    }

    /// ENDPOINT未指定時のデフォルトエンドポイント
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1/chat/completions",
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Self::Anthropic => "https://api.anthropic.com/v1/messages",
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = String;

    /// 大文字小文字を区別しない
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "gemini" => Ok(Self::Gemini),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(format!("unknown provider type: {}", other)),
        }
    }
}

/// 監視対象プロバイダの設定
///
/// プロセス起動時に一度だけ構築され、以後は読み取り専用。
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// 一意で安定したキー（CHECK_GROUPSの要素）
    pub id: String,
    /// 表示名
    pub name: String,
    /// プロバイダ種別
    pub provider_type: ProviderType,
    /// ベースURL（またはフルURL）
    pub endpoint: String,
    /// プローブ対象モデル
    pub model: String,
    /// APIキー。ログには`mask_key`経由でのみ出す
    pub credential: String,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("provider_type", &self.provider_type)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("credential", &mask_key(Some(&self.credential)))
            .finish()
    }
}

/// APIキーをマスクする（先頭4文字と末尾2文字のみ残す）
pub fn mask_key(key: Option<&str>) -> String {
    let Some(key) = key.filter(|k| !k.is_empty()) else {
        return String::new();
    };
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}****{}", head, tail)
}
