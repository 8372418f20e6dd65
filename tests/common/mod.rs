//! Shared fixtures for integration tests: RSA client keys, signed client
//! assertions and an in-memory registry.

#![allow(dead_code)]

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use idp::config::Config;
use idp::http::AppState;
use idp::oauth::types::{
    AUTHORIZATION_CODE, ClientCreateRequest, JWT_BEARER_ASSERTION_TYPE, PRIVATE_KEY_JWT,
};
use idp::oauth::{ClientRegistry, TokenForm, TokenRequestValidator};
use idp::storage::{MemoryClientCache, MemoryClientStore};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use rsa::{
    RsaPrivateKey,
    pkcs1::{EncodeRsaPrivateKey, LineEnding},
    traits::PublicKeyParts,
};
use serde_json::{Map, Value, json};

pub const AUDIENCE: &str = "https://idp.example.com/oauth/token";
pub const REDIRECT_URI: &str = "http://service.com/home";

pub struct ClientKey {
    private_pem: String,
    n: String,
    e: String,
}

impl ClientKey {
    fn generate() -> Self {
        let private_key = RsaPrivateKey::new(&mut rand::rngs::OsRng, 2048).unwrap();
        Self {
            private_pem: private_key.to_pkcs1_pem(LineEnding::LF).unwrap().to_string(),
            n: URL_SAFE_NO_PAD.encode(private_key.n().to_bytes_be()),
            e: URL_SAFE_NO_PAD.encode(private_key.e().to_bytes_be()),
        }
    }

    pub fn public_jwk(&self) -> Map<String, Value> {
        let mut jwk = Map::new();
        jwk.insert("kty".to_string(), json!("RSA"));
        jwk.insert("n".to_string(), json!(self.n));
        jwk.insert("e".to_string(), json!(self.e));
        jwk
    }

    pub fn sign(&self, claims: &Value) -> String {
        let key = EncodingKey::from_rsa_pem(self.private_pem.as_bytes()).unwrap();
        encode(&Header::new(Algorithm::RS256), claims, &key).unwrap()
    }

    /// Assertion for `client_id` aimed at `AUDIENCE`, valid for five minutes
    pub fn assertion(&self, client_id: &str) -> String {
        self.sign(&claims(client_id, AUDIENCE, 300))
    }
}

pub fn claims(client_id: &str, audience: &str, expires_in: i64) -> Value {
    let now = Utc::now().timestamp();
    json!({
        "iss": client_id,
        "sub": client_id,
        "aud": audience,
        "iat": now,
        "exp": now + expires_in,
        "jti": uuid::Uuid::new_v4().to_string(),
    })
}

pub static CLIENT_KEY: LazyLock<ClientKey> = LazyLock::new(ClientKey::generate);

pub static ROGUE_KEY: LazyLock<ClientKey> = LazyLock::new(ClientKey::generate);

pub fn test_config(enable_client_api: bool) -> Config {
    Config {
        version: "test".to_string(),
        http_port: "8080".to_string().try_into().unwrap(),
        external_base: "https://idp.example.com".to_string(),
        token_endpoint_audience: AUDIENCE.to_string(),
        supported_grant_types: vec![AUTHORIZATION_CODE.to_string()].into(),
        supported_client_assertion_types: vec![JWT_BEARER_ASSERTION_TYPE.to_string()].into(),
        supported_client_auth_methods: vec![PRIVATE_KEY_JWT.to_string()].into(),
        client_assertion_leeway: "30s".to_string().try_into().unwrap(),
        client_cache_ttl: "1m".to_string().try_into().unwrap(),
        storage_backend: "memory".to_string(),
        database_url: None,
        redis_url: None,
        enable_client_api: enable_client_api.to_string().try_into().unwrap(),
    }
}

pub fn memory_registry() -> ClientRegistry {
    ClientRegistry::new(
        Arc::new(MemoryClientStore::new()),
        Arc::new(MemoryClientCache::new(Duration::from_secs(60))),
    )
}

/// Router state over a fresh in-memory registry
pub fn app_state(enable_client_api: bool) -> AppState {
    let config = test_config(enable_client_api);
    let client_registry = memory_registry();
    let token_validator = TokenRequestValidator::from_config(client_registry.clone(), &config);
    AppState {
        config: Arc::new(config),
        client_registry,
        token_validator,
    }
}

/// Create request for a client allowed to use the authorization code grant
/// with `private_key_jwt`
pub fn create_request(client_id: &str) -> ClientCreateRequest {
    ClientCreateRequest {
        client_id: client_id.to_string(),
        client_name: "Service Portal".to_string(),
        relying_party_id: "RELYING_PARTY_ID".to_string(),
        logo_uri: "http://service.com/logo.png".to_string(),
        public_key: CLIENT_KEY.public_jwk(),
        redirect_uris: vec![Some(REDIRECT_URI.to_string())],
        user_claims: vec![Some("name".to_string()), Some("email".to_string())],
        auth_context_refs: vec![Some("mosip:idp:acr:static-code".to_string())],
        grant_types: vec![Some(AUTHORIZATION_CODE.to_string())],
        client_auth_methods: vec![Some(PRIVATE_KEY_JWT.to_string())],
    }
}

pub fn token_form(client_id: &str, assertion: String) -> TokenForm {
    TokenForm {
        grant_type: Some(AUTHORIZATION_CODE.to_string()),
        code: Some("auth-code-1".to_string()),
        client_id: Some(client_id.to_string()),
        redirect_uri: Some(REDIRECT_URI.to_string()),
        client_assertion_type: Some(JWT_BEARER_ASSERTION_TYPE.to_string()),
        client_assertion: Some(assertion),
    }
}
