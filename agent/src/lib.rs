pub mod agent;
pub mod config;

pub use agent::{AgentClient, AgentError, AgentInvoker, collect_completion, new_session_id};
pub use config::{AgentConfig, ConfigError, DEFAULT_AGENT_ALIAS_ID, REQUIRED_VARS};
