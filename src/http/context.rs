//! Application state shared by the HTTP handlers.

use std::sync::Arc;

use crate::config::Config;
use crate::oauth::clients::ClientRegistry;
use crate::oauth::token_request::TokenRequestValidator;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Client registry for the management API
    pub client_registry: ClientRegistry,
    pub token_validator: TokenRequestValidator,
}
