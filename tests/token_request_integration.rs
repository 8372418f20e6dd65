//! Token request validation tests driving the registry, cache and assertion
//! verifier together through the public API.

mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use common::*;
use idp::errors::TokenRequestError;
use idp::http::{TokenRequestAcceptance, build_router};
use idp::oauth::TokenRequestValidator;
use idp::oauth::types::{AUTHORIZATION_CODE, ClientUpdateRequest, JWT_BEARER_ASSERTION_TYPE};
use serde_json::Value;

fn validator_for(registry: idp::oauth::ClientRegistry) -> TokenRequestValidator {
    TokenRequestValidator::from_config(registry, &test_config(false))
}

#[tokio::test]
async fn test_valid_token_request_is_accepted() {
    let registry = memory_registry();
    registry.create_client(create_request("mock_id_v1")).await.unwrap();
    let validator = validator_for(registry);

    let accepted = validator
        .validate_form(token_form("mock_id_v1", CLIENT_KEY.assertion("mock_id_v1")))
        .await
        .unwrap();

    assert_eq!(accepted.client.client_id, "mock_id_v1");
    assert_eq!(accepted.request.code, "auth-code-1");
    assert_eq!(accepted.assertion.iss, "mock_id_v1");
}

#[tokio::test]
async fn test_unknown_client_is_rejected() {
    let validator = validator_for(memory_registry());

    let result = validator
        .validate_form(token_form("unknown", CLIENT_KEY.assertion("unknown")))
        .await;

    assert_eq!(result.unwrap_err(), TokenRequestError::InvalidClient);
}

#[tokio::test]
async fn test_grant_type_not_registered_for_client() {
    let registry = memory_registry();
    let mut request = create_request("no_grants");
    request.grant_types = vec![None];
    registry.create_client(request).await.unwrap();
    let validator = validator_for(registry);

    let result = validator
        .validate_form(token_form("no_grants", CLIENT_KEY.assertion("no_grants")))
        .await;

    assert!(matches!(
        result,
        Err(TokenRequestError::UnauthorizedClient(_))
    ));
}

#[tokio::test]
async fn test_auth_method_not_registered_for_client() {
    let registry = memory_registry();
    let mut request = create_request("secret_basic_only");
    request.client_auth_methods = vec![Some("client_secret_basic".to_string())];
    registry.create_client(request).await.unwrap();
    let validator = validator_for(registry);

    let result = validator
        .validate_form(token_form(
            "secret_basic_only",
            CLIENT_KEY.assertion("secret_basic_only"),
        ))
        .await;

    assert!(matches!(
        result,
        Err(TokenRequestError::UnauthorizedClient(_))
    ));
}

#[tokio::test]
async fn test_assertion_signed_by_another_key() {
    let registry = memory_registry();
    registry.create_client(create_request("mock_id_v1")).await.unwrap();
    let validator = validator_for(registry);

    let result = validator
        .validate_form(token_form("mock_id_v1", ROGUE_KEY.assertion("mock_id_v1")))
        .await;

    assert!(matches!(
        result,
        Err(TokenRequestError::InvalidClientAssertion(_))
    ));
}

#[tokio::test]
async fn test_assertion_for_another_audience() {
    let registry = memory_registry();
    registry.create_client(create_request("mock_id_v1")).await.unwrap();
    let validator = validator_for(registry);

    let assertion = CLIENT_KEY.sign(&claims(
        "mock_id_v1",
        "https://other-idp.example.com/oauth/token",
        300,
    ));
    let result = validator
        .validate_form(token_form("mock_id_v1", assertion))
        .await;

    assert!(matches!(
        result,
        Err(TokenRequestError::InvalidClientAssertion(_))
    ));
}

#[tokio::test]
async fn test_expired_assertion() {
    let registry = memory_registry();
    registry.create_client(create_request("mock_id_v1")).await.unwrap();
    let validator = validator_for(registry);

    // Expired well beyond the configured leeway
    let assertion = CLIENT_KEY.sign(&claims("mock_id_v1", AUDIENCE, -600));
    let result = validator
        .validate_form(token_form("mock_id_v1", assertion))
        .await;

    assert!(matches!(
        result,
        Err(TokenRequestError::InvalidClientAssertion(_))
    ));
}

#[tokio::test]
async fn test_unregistered_redirect_uri() {
    let registry = memory_registry();
    registry.create_client(create_request("mock_id_v1")).await.unwrap();
    let validator = validator_for(registry);

    let mut form = token_form("mock_id_v1", CLIENT_KEY.assertion("mock_id_v1"));
    form.redirect_uri = Some("http://service.com/elsewhere".to_string());
    let result = validator.validate_form(form).await;

    assert!(matches!(result, Err(TokenRequestError::InvalidRequest(_))));
}

#[tokio::test]
async fn test_unsupported_grant_type_literal() {
    let registry = memory_registry();
    registry.create_client(create_request("mock_id_v1")).await.unwrap();
    let validator = validator_for(registry);

    let mut form = token_form("mock_id_v1", CLIENT_KEY.assertion("mock_id_v1"));
    form.grant_type = Some("client_credentials".to_string());
    let result = validator.validate_form(form).await;

    assert!(matches!(result, Err(TokenRequestError::InvalidRequest(_))));
}

#[tokio::test]
async fn test_deactivated_client_is_rejected_after_cached_use() {
    let registry = memory_registry();
    registry.create_client(create_request("mock_id_v1")).await.unwrap();
    let validator = validator_for(registry.clone());

    // First validation populates the cache
    validator
        .validate_form(token_form("mock_id_v1", CLIENT_KEY.assertion("mock_id_v1")))
        .await
        .unwrap();

    registry
        .update_client(
            "mock_id_v1",
            ClientUpdateRequest {
                client_name: "Service Portal".to_string(),
                logo_uri: "http://service.com/logo.png".to_string(),
                redirect_uris: vec![Some(REDIRECT_URI.to_string())],
                user_claims: vec![],
                auth_context_refs: vec![],
                grant_types: vec![Some("authorization_code".to_string())],
                client_auth_methods: vec![Some("private_key_jwt".to_string())],
                status: "inactive".to_string(),
            },
        )
        .await
        .unwrap();

    let result = validator
        .validate_form(token_form("mock_id_v1", CLIENT_KEY.assertion("mock_id_v1")))
        .await;

    assert_eq!(result.unwrap_err(), TokenRequestError::InvalidClient);
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn test_valid_token_request_with_sqlite_store() {
    use idp::oauth::ClientRegistry;
    use idp::storage::{MemoryClientCache, sqlite::SqliteClientStore};
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::Arc;
    use std::time::Duration;

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let store = SqliteClientStore::new(pool);
    store.migrate().await.unwrap();

    let registry = ClientRegistry::new(
        Arc::new(store),
        Arc::new(MemoryClientCache::new(Duration::from_secs(60))),
    );
    registry.create_client(create_request("mock_id_v1")).await.unwrap();
    let validator = validator_for(registry);

    let accepted = validator
        .validate_form(token_form("mock_id_v1", CLIENT_KEY.assertion("mock_id_v1")))
        .await
        .unwrap();
    assert_eq!(accepted.client.relying_party_id, "RELYING_PARTY_ID");
    assert_eq!(accepted.client.claims, vec!["name", "email"]);
}

async fn token_request_server() -> TestServer {
    let state = app_state(false);
    state
        .client_registry
        .create_client(create_request("mock_id_v1"))
        .await
        .unwrap();
    TestServer::new(build_router(state)).unwrap()
}

fn token_request_fields(client_id: &str, assertion: &str) -> Vec<(&'static str, String)> {
    vec![
        ("grant_type", AUTHORIZATION_CODE.to_string()),
        ("code", "auth-code-1".to_string()),
        ("client_id", client_id.to_string()),
        ("redirect_uri", REDIRECT_URI.to_string()),
        ("client_assertion_type", JWT_BEARER_ASSERTION_TYPE.to_string()),
        ("client_assertion", assertion.to_string()),
    ]
}

#[tokio::test]
async fn test_token_request_route_accepts_valid_request() {
    let server = token_request_server().await;

    let response = server
        .post("/oauth/token-request")
        .form(&token_request_fields(
            "mock_id_v1",
            &CLIENT_KEY.assertion("mock_id_v1"),
        ))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let accepted: TokenRequestAcceptance = response.json();
    assert_eq!(accepted.client_id, "mock_id_v1");
    assert_eq!(accepted.code, "auth-code-1");
    assert_eq!(accepted.claims, vec!["name", "email"]);
    assert!(accepted.assertion_jti.is_some());
}

#[tokio::test]
async fn test_token_request_route_rejects_wrong_key() {
    let server = token_request_server().await;

    let response = server
        .post("/oauth/token-request")
        .form(&token_request_fields(
            "mock_id_v1",
            &ROGUE_KEY.assertion("mock_id_v1"),
        ))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"], "invalid_client_assertion");
}

#[tokio::test]
async fn test_token_request_route_rejects_missing_field() {
    let server = token_request_server().await;

    let mut fields = token_request_fields("mock_id_v1", &CLIENT_KEY.assertion("mock_id_v1"));
    fields.retain(|(name, _)| *name != "code");
    let response = server.post("/oauth/token-request").form(&fields).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "invalid_request");
}
