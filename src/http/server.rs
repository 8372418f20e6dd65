//! Main router configuration.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use super::{
    context::AppState,
    handler_oauth_clients::{create_client_handler, get_client_handler, update_client_handler},
    handler_token_request::handle_token_request,
};

/// Build the application router
pub fn build_router(ctx: AppState) -> Router {
    let mut router = Router::new().route("/oauth/token-request", post(handle_token_request));

    // Conditionally add client API endpoints
    if *ctx.config.enable_client_api.as_ref() {
        let client_mgmt_routes = Router::new()
            .route("/oidc-client", post(create_client_handler))
            .route(
                "/oidc-client/{client_id}",
                get(get_client_handler).put(update_client_handler),
            );
        router = router.nest("/client-mgmt", client_mgmt_routes);
    }

    router.layer(TraceLayer::new_for_http()).with_state(ctx)
}
