pub mod error;
pub mod handlers;
pub mod http;

pub use error::ApiError;
pub use http::{ServerConfig, ServerState, build_router, start_server};
