//! HTTP Layer - JSON API

pub mod dto;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use identity::{CallerIdentity, USER_ID_HEADER};
pub use routes::create_routes;
pub use server::{HttpServer, ServerConfig};
pub use state::AppState;
