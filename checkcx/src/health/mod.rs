//! ヘルスチェック
//!
//! 設定された生成AIプロバイダへ最小のpingリクエストを送り、
//! レイテンシとHTTP結果から稼働状態を分類する。

pub mod adapters;
pub mod classifier;
pub mod fanout;
pub mod probe;

pub use adapters::{adapter_for, ensure_path, ProbeAdapter, ProbeRequest};
pub use classifier::{classify, ProbeOutcome, Verdict, DEGRADED_THRESHOLD_MS};
pub use fanout::run_provider_checks;
pub use probe::{ProbeRunner, PROBE_TIMEOUT_SECS};
