// Deskrelay gateway
//
// Session-authenticated HTTP gateway in front of a helpdesk provider.
// Library target so the binary and integration tests share the router.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod helpdesk;
pub mod openapi;
pub mod pages;
pub mod state;

pub use app::{build_router, spawn_session_purger};
pub use config::GatewayConfig;
pub use error::ApiError;
pub use helpdesk::HelpdeskClient;
pub use state::AppState;
