//! Bedrock Agent 接続設定
//!
//! プロセス起動時に環境変数から一度だけ読み込まれ、以降は変更されない。

use aws_sdk_bedrockagentruntime::config::Credentials;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// 必須の環境変数
pub const REQUIRED_VARS: [&str; 4] = [
    "AWS_ACCESS_KEY_ID",
    "AWS_SECRET_ACCESS_KEY",
    "AWS_REGION",
    "BEDROCK_AGENT_ID",
];

/// `BEDROCK_AGENT_ALIAS_ID` 未設定時に使用するドラフトエイリアス
pub const DEFAULT_AGENT_ALIAS_ID: &str = "TSTALIASID";

const CREDENTIALS_PROVIDER_NAME: &str = "environment";

/// 設定読み込みのエラー型
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingVariables(Vec<String>),
}

/// Agent の接続設定
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// 静的な AWS 認証情報
    pub credentials: Credentials,
    pub region: String,
    pub agent_id: String,
    pub agent_alias_id: String,
    /// エンドポイントの上書き（オプション）
    pub endpoint_url: Option<String>,
}

impl AgentConfig {
    /// プロセスの環境変数から設定を読み込む
    ///
    /// # Errors
    /// 必須の環境変数が一つでも欠けている場合、欠けているすべての名前を含む
    /// `ConfigError::MissingVariables` を返す
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// `.env` ファイルの値で補いつつ環境変数から設定を読み込む
    ///
    /// プロセスの環境変数が優先される。ファイルが存在しない場合は
    /// `from_env` と同じ動作になる。
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_file_and_lookup(path, |name| std::env::var(name).ok())
    }

    fn from_file_and_lookup<F>(path: impl AsRef<Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = path.as_ref();
        let file_vars: HashMap<String, String> = match dotenvy::from_path_iter(path) {
            Ok(iter) => iter.filter_map(Result::ok).collect(),
            Err(e) => {
                debug!("No dotenv file loaded from {}: {}", path.display(), e);
                HashMap::new()
            }
        };

        Self::from_lookup(|name| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .or_else(|| file_vars.get(name).cloned())
        })
    }

    /// 任意のルックアップ関数から設定を読み込む
    ///
    /// 空文字列の値は未設定として扱う。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let missing: Vec<String> = REQUIRED_VARS
            .iter()
            .filter(|name| get(name).is_none())
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::MissingVariables(missing));
        }

        // 必須変数はすべて存在することを確認済み
        let required = |name: &str| get(name).unwrap_or_default();

        let credentials = Credentials::new(
            required("AWS_ACCESS_KEY_ID"),
            required("AWS_SECRET_ACCESS_KEY"),
            get("AWS_SESSION_TOKEN"),
            None,
            CREDENTIALS_PROVIDER_NAME,
        );

        Ok(Self {
            credentials,
            region: required("AWS_REGION"),
            agent_id: required("BEDROCK_AGENT_ID"),
            agent_alias_id: get("BEDROCK_AGENT_ALIAS_ID")
                .unwrap_or_else(|| DEFAULT_AGENT_ALIAS_ID.to_string()),
            endpoint_url: get("BEDROCK_ENDPOINT_URL"),
        })
    }
}
