use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::{self, BehaviorVersion, Region};
use aws_sdk_bedrockagentruntime::Client;
use aws_sdk_bedrockagentruntime::error::DisplayErrorContext;
use aws_sdk_bedrockagentruntime::types::ResponseStream;
use futures::stream::{self, Stream, StreamExt};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::{AgentConfig, ConfigError};

/// AgentClientのエラー型
#[derive(thiserror::Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Error invoking Bedrock agent: {0}")]
    RemoteInvocation(String),
}

/// Agent 呼び出しの抽象
///
/// HTTP サーバーや CLI はこのトレイト越しに Agent を利用する。
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    /// プロンプトを送信し、組み立て済みの応答テキストを返す
    async fn invoke(&self, prompt: &str) -> Result<String, AgentError>;

    /// 呼び出し対象の Agent ID
    fn agent_id(&self) -> &str;

    /// 接続先リージョン
    fn region(&self) -> &str;
}

/// Agent クライアント構造体
///
/// Bedrock Agents との通信のみを担当する。会話履歴は保持せず、
/// 呼び出しごとに新しいセッションIDを発行する。
pub struct AgentClient {
    client: Client,
    config: AgentConfig,
}

impl AgentClient {
    /// 新しい AgentClient を作成する
    ///
    /// # Arguments
    /// * `config` - 起動時に読み込まれた接続設定
    ///
    /// # Returns
    /// 初期化された `AgentClient` インスタンス
    pub async fn new(config: AgentConfig) -> Result<Self, AgentError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(config.credentials.clone())
            .retry_config(RetryConfig::disabled());

        if let Some(endpoint_url) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        let sdk_config = loader.load().await;
        let client = Client::new(&sdk_config);

        info!(
            agent_id = %config.agent_id,
            agent_alias_id = %config.agent_alias_id,
            region = %config.region,
            "Bedrock agent client initialized"
        );

        Ok(Self { client, config })
    }

    /// 環境変数から設定を読み込んで AgentClient を作成する
    pub async fn from_env() -> Result<Self, AgentError> {
        let config = AgentConfig::from_env()?;
        Self::new(config).await
    }

    /// `.env` ファイルで補った環境変数から設定を読み込んで AgentClient を作成する
    pub async fn from_env_file(path: impl AsRef<std::path::Path>) -> Result<Self, AgentError> {
        let config = AgentConfig::from_env_file(path)?;
        Self::new(config).await
    }

    /// 接続設定を取得する
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// プロンプトを Agent に送信し、ストリーミング応答を連結して返す
    ///
    /// # Arguments
    /// * `prompt` - ユーザーの入力テキスト
    ///
    /// # Returns
    /// * `Ok(String)` - 受信したチャンクを到着順に連結したテキスト
    /// * `Err(AgentError::RemoteInvocation)` - 通信・認証・ストリームのいずれかで失敗した場合
    ///
    /// # Note
    /// リトライは行わない。ストリームの途中で失敗した場合、それまでに受信した
    /// テキストは破棄される。
    pub async fn invoke(&self, prompt: &str) -> Result<String, AgentError> {
        let session_id = new_session_id();
        debug!(%session_id, "Invoking Bedrock agent");

        let output = self
            .client
            .invoke_agent()
            .agent_id(&self.config.agent_id)
            .agent_alias_id(&self.config.agent_alias_id)
            .session_id(&session_id)
            .input_text(prompt)
            .send()
            .await
            .map_err(|e| {
                let err = invocation_error(e);
                error!(%session_id, "Bedrock agent request failed: {}", err);
                err
            })?;

        let chunks = stream::unfold(Some(output.completion), |receiver| async move {
            let mut receiver = receiver?;
            loop {
                match receiver.recv().await {
                    Ok(Some(event)) => {
                        if let Some(bytes) = chunk_bytes(event) {
                            return Some((Ok(bytes), Some(receiver)));
                        }
                    }
                    Ok(None) => return None,
                    Err(e) => return Some((Err(invocation_error(e)), None)),
                }
            }
        });

        collect_completion(chunks).await.inspect_err(|e| {
            error!(%session_id, "Bedrock agent stream failed: {}", e);
        })
    }
}

#[async_trait]
impl AgentInvoker for AgentClient {
    async fn invoke(&self, prompt: &str) -> Result<String, AgentError> {
        AgentClient::invoke(self, prompt).await
    }

    fn agent_id(&self) -> &str {
        &self.config.agent_id
    }

    fn region(&self) -> &str {
        &self.config.region
    }
}

/// イベントからチャンクのバイト列を取り出す
///
/// trace / returnControl / files などのイベントや、bytes を持たないチャンクは `None`。
fn chunk_bytes(event: ResponseStream) -> Option<Vec<u8>> {
    match event {
        ResponseStream::Chunk(part) => part.bytes.map(|bytes| bytes.into_inner()),
        _ => None,
    }
}

/// SDK のエラーを原因の連鎖ごと文字列化して包む
fn invocation_error<E>(err: E) -> AgentError
where
    E: std::error::Error + 'static,
{
    AgentError::RemoteInvocation(DisplayErrorContext(&err).to_string())
}

/// 呼び出しごとに一意なセッションIDを生成する
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// チャンクのストリームを最後まで読み、UTF-8 として到着順に連結する
///
/// # Returns
/// * `Ok(String)` - 連結結果。チャンクが一つもなければ空文字列
/// * `Err(AgentError::RemoteInvocation)` - ストリームがエラーを返した、またはチャンクが
///   UTF-8 として不正だった場合。途中までの結果は返さない
pub async fn collect_completion<S>(chunks: S) -> Result<String, AgentError>
where
    S: Stream<Item = Result<Vec<u8>, AgentError>>,
{
    let mut chunks = std::pin::pin!(chunks);
    let mut full_response = String::new();
    let mut count = 0usize;

    while let Some(chunk) = chunks.next().await {
        let text = String::from_utf8(chunk?)
            .map_err(|e| AgentError::RemoteInvocation(format!("Invalid UTF-8 in chunk: {}", e)))?;
        full_response.push_str(&text);
        count += 1;
    }

    debug!(chunks = count, bytes = full_response.len(), "Agent response assembled");
    Ok(full_response)
}
