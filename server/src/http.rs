use agent::AgentInvoker;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;

/// HTTP サーバーの設定
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// バインドアドレス（例: "0.0.0.0:5000"）
    pub address: String,
}

impl ServerConfig {
    pub fn new(address: String) -> Self {
        Self { address }
    }
}

/// ハンドラ間で共有する状態
///
/// 起動時に生成した Agent クライアントを一つだけ保持する。
#[derive(Clone)]
pub struct ServerState {
    pub agent: Arc<dyn AgentInvoker>,
}

impl ServerState {
    pub fn new(agent: Arc<dyn AgentInvoker>) -> Self {
        Self { agent }
    }
}

/// ルーティングを構築する
pub fn build_router(state: ServerState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/chat", post(handlers::chat))
        .route("/examples", get(handlers::examples))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// HTTP サーバーを起動する
pub async fn start_server(
    config: ServerConfig,
    agent: Arc<dyn AgentInvoker>,
) -> Result<(), std::io::Error> {
    let agent_id = agent.agent_id().to_string();
    let region = agent.region().to_string();
    let app = build_router(ServerState::new(agent));

    let listener = tokio::net::TcpListener::bind(&config.address).await?;

    println!("Server starting on http://{}", config.address);
    println!("  Agent ID: {}", agent_id);
    println!("  Region:   {}", region);
    println!("\nAvailable endpoints:");
    println!("  GET  /health    - Server status");
    println!("  POST /chat      - Send a message to the agent");
    println!("  GET  /examples  - Example prompts");
    println!("\nPress Ctrl+C to stop\n");

    info!("HTTP server listening on {}", config.address);

    axum::serve(listener, app).await
}
