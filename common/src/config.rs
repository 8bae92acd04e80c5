//! 接続先の設定

use crate::nocache::join_base;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8384";

/// 環境変数名（ネイティブは実行時、WASMはビルド時に読む）
pub const BASE_URL_ENV: &str = "VTO_API_BASE_URL";

pub const VTO_PATH: &str = "/vto";
pub const CLOTHES_PATH: &str = "/clothes";
pub const HEALTH_PATH: &str = "/health";
pub const METRICS_PATH: &str = "/metrics";

/// リモートの試着サービス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub base_url: String,
    /// `/vto` のタイムアウト（5分）
    pub process_timeout_ms: u64,
    /// `/health` と `/metrics` のタイムアウト
    pub check_timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            process_timeout_ms: 300_000,
            check_timeout_ms: 5_000,
        }
    }
}

impl ServiceConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn endpoint(&self, path: &str) -> String {
        join_base(&self.base_url, path)
    }

    pub fn process_timeout(&self) -> Duration {
        Duration::from_millis(self.process_timeout_ms)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }
}
