pub mod auth;
pub mod cli;
pub mod config;
pub mod handlers;
pub mod server;
pub mod state;
pub mod storage;

pub use config::ServerConfig;
pub use server::{api_router, service_router};
pub use state::ApiState;
