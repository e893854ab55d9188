//! クライアント設定管理
//!
//! このクレートは plugin-admin の設定を管理します。
//! - デフォルト設定の提供
//! - TOML ファイルからの読み込み
//! - 設定の保存

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// クライアント設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// バックエンド API のベース URL（`/system-settings/...` の手前まで）
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Bearer 認証トークン（未設定なら Authorization ヘッダーを付けない）
    #[serde(default)]
    pub auth_token: Option<String>,

    /// リクエストタイムアウト（秒）
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// RUST_LOG 未設定時に使うログフィルタ
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_api_base_url() -> String {
    "http://localhost:8000/api/".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            auth_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            log_filter: default_log_filter(),
        }
    }
}

impl AppConfig {
    /// デフォルト設定を作成
    pub fn new() -> Self {
        Self::default()
    }

    /// TOML ファイルから設定を読み込み
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse config file")?;

        Ok(config)
    }

    /// 指定パスから読み込み（なければデフォルト設定を返す）
    pub fn load_or_default_from(path: &Path) -> Self {
        if path.exists() {
            Self::load_from_file(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config ({e:#}), using defaults");
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// デフォルト設定ファイルパスから読み込み（なければデフォルト設定を返す）
    pub fn load_or_default() -> Self {
        Self::load_or_default_from(&get_default_config_path())
    }

    /// 設定をファイルに保存
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// タイムアウトを `Duration` で取得（0 は 1 秒に切り上げ）
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// 空白のみのトークンは未設定として扱う
    pub fn bearer_token(&self) -> Option<&str> {
        self.auth_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// デフォルトのデータディレクトリを取得
/// Windows: %USERPROFILE%\.plugin-admin
/// Unix: ~/.plugin-admin
pub fn get_default_data_dir() -> PathBuf {
    if let Some(home) = dirs::home_dir() {
        home.join(".plugin-admin")
    } else {
        PathBuf::from(".plugin-admin")
    }
}

/// デフォルトの設定ファイルパスを取得
pub fn get_default_config_path() -> PathBuf {
    get_default_data_dir().join("config.toml")
}
