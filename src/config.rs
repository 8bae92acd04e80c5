use crate::error::{Result, StudioError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use vto_common::config::{ServiceConfig, BASE_URL_ENV};

/// `~/.config/vto-studio/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub process_timeout_seconds: Option<u64>,
    #[serde(default)]
    pub check_timeout_seconds: Option<u64>,
    /// 結果画像の保存先（未指定ならカレントディレクトリ）
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| StudioError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("vto-studio").join("config.json"))
    }

    pub fn set_base_url(&mut self, url: String) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(StudioError::Config(format!("URLはhttp(s)で始めてください: {}", url)));
        }
        self.base_url = Some(url);
        self.save()
    }

    /// 接続先を決定する
    ///
    /// 優先順位: コマンドライン > 環境変数 > 設定ファイル > 既定値
    pub fn service_config(&self, cli_base_url: Option<&str>) -> ServiceConfig {
        let env_base_url = std::env::var(BASE_URL_ENV).ok().filter(|v| !v.trim().is_empty());
        self.resolve(cli_base_url, env_base_url.as_deref())
    }

    fn resolve(&self, cli_base_url: Option<&str>, env_base_url: Option<&str>) -> ServiceConfig {
        let mut service = ServiceConfig::default();

        if let Some(url) = cli_base_url
            .or(env_base_url)
            .or(self.base_url.as_deref())
        {
            service.base_url = url.to_string();
        }
        if let Some(secs) = self.process_timeout_seconds {
            service.process_timeout_ms = secs.saturating_mul(1000);
        }
        if let Some(secs) = self.check_timeout_seconds {
            service.check_timeout_ms = secs.saturating_mul(1000);
        }
        service
    }
}
