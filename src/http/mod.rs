//! Axum HTTP server for token request authentication and the client management API.

pub mod context;
mod handler_oauth_clients;
mod handler_token_request;
pub mod server;

pub use context::AppState;
pub use handler_oauth_clients::ClientView;
pub use handler_token_request::TokenRequestAcceptance;
pub use server::build_router;
