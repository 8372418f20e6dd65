//! RSA key fixtures and assertion signing helpers shared by unit tests.

use std::sync::LazyLock;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use rsa::{
    RsaPrivateKey,
    pkcs1::{EncodeRsaPrivateKey, LineEnding},
    traits::PublicKeyParts,
};
use serde_json::{Value, json};

use crate::oauth::jwk::{RsaJwk, jwk_thumbprint};

pub(crate) const TEST_AUDIENCE: &str = "https://idp.example.com/oauth/token";

pub(crate) struct TestKey {
    private_pem: String,
    n: String,
    e: String,
}

impl TestKey {
    fn generate() -> Self {
        let private_key = RsaPrivateKey::new(&mut rand::rngs::OsRng, 2048).unwrap();
        let private_pem = private_key.to_pkcs1_pem(LineEnding::LF).unwrap().to_string();
        Self {
            private_pem,
            n: URL_SAFE_NO_PAD.encode(private_key.n().to_bytes_be()),
            e: URL_SAFE_NO_PAD.encode(private_key.e().to_bytes_be()),
        }
    }

    pub(crate) fn public_jwk(&self) -> serde_json::Map<String, Value> {
        json!({"kty": "RSA", "n": self.n, "e": self.e})
            .as_object()
            .cloned()
            .unwrap()
    }

    pub(crate) fn thumbprint(&self) -> String {
        jwk_thumbprint(&RsaJwk {
            kty: "RSA".to_string(),
            n: self.n.clone(),
            e: self.e.clone(),
            kid: None,
            key_use: None,
            alg: None,
        })
    }

    pub(crate) fn sign(&self, algorithm: Algorithm, claims: &Value) -> String {
        let key = EncodingKey::from_rsa_pem(self.private_pem.as_bytes()).unwrap();
        encode(&Header::new(algorithm), claims, &key).unwrap()
    }

    /// Assertion claims for `client_id` valid for the next five minutes
    pub(crate) fn assertion(&self, client_id: &str) -> String {
        self.sign(Algorithm::RS256, &assertion_claims(client_id))
    }
}

pub(crate) fn assertion_claims(client_id: &str) -> Value {
    let now = Utc::now().timestamp();
    json!({
        "iss": client_id,
        "sub": client_id,
        "aud": TEST_AUDIENCE,
        "iat": now,
        "exp": now + 300,
        "jti": format!("jti-{}", now),
    })
}

pub(crate) static TEST_KEY: LazyLock<TestKey> = LazyLock::new(TestKey::generate);

pub(crate) static OTHER_KEY: LazyLock<TestKey> = LazyLock::new(TestKey::generate);
