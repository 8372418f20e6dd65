//! Client assertion verification for `private_key_jwt` authentication (RFC 7523).

use std::time::Duration;

use jsonwebtoken::{Validation, decode, decode_header, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::errors::TokenRequestError;
use crate::oauth::jwk::ClientPublicKey;

/// `aud` claim, which RFC 7519 allows as a single string or an array
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

/// Claims carried by a verified client assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAssertionClaims {
    pub iss: String,
    #[serde(default)]
    pub sub: Option<String>,
    pub aud: Audience,
    pub exp: i64,
    #[serde(default)]
    pub nbf: Option<i64>,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub jti: Option<String>,
}

/// Verifies client assertions addressed to this IdP's token endpoint
#[derive(Debug, Clone)]
pub struct ClientAssertionVerifier {
    audience: String,
    leeway: Duration,
}

impl ClientAssertionVerifier {
    pub fn new(audience: impl Into<String>, leeway: Duration) -> Self {
        Self {
            audience: audience.into(),
            leeway,
        }
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Verify the signature with `public_key`, then require `iss == client_id`,
    /// `aud` containing the token endpoint audience, and the current time
    /// inside the `nbf`/`exp` window. A present `sub` must also equal `client_id`.
    pub fn verify(
        &self,
        assertion: &str,
        client_id: &str,
        public_key: &ClientPublicKey,
    ) -> Result<ClientAssertionClaims, TokenRequestError> {
        let header = decode_header(assertion).map_err(|e| {
            TokenRequestError::InvalidClientAssertion(format!("Malformed assertion: {}", e))
        })?;

        if !public_key.algorithms().contains(&header.alg) {
            return Err(TokenRequestError::InvalidClientAssertion(format!(
                "Algorithm {:?} is not accepted for this client key",
                header.alg
            )));
        }

        let mut validation = Validation::new(header.alg);
        validation.algorithms = public_key.algorithms().to_vec();
        validation.leeway = self.leeway.as_secs();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[client_id]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        let token_data =
            decode::<ClientAssertionClaims>(assertion, public_key.decoding_key(), &validation)
                .map_err(|e| {
                    let reason = match e.kind() {
                        ErrorKind::InvalidSignature => "signature verification failed".to_string(),
                        ErrorKind::ExpiredSignature => "assertion has expired".to_string(),
                        ErrorKind::ImmatureSignature => "assertion is not yet valid".to_string(),
                        ErrorKind::InvalidAudience => "audience mismatch".to_string(),
                        ErrorKind::InvalidIssuer => "issuer does not match client_id".to_string(),
                        ErrorKind::InvalidAlgorithm => "algorithm not accepted".to_string(),
                        ErrorKind::MissingRequiredClaim(claim) => {
                            format!("missing required claim {}", claim)
                        }
                        _ => format!("malformed assertion: {}", e),
                    };
                    TokenRequestError::InvalidClientAssertion(reason)
                })?;

        let claims = token_data.claims;
        if let Some(sub) = &claims.sub {
            if sub != client_id {
                return Err(TokenRequestError::InvalidClientAssertion(
                    "subject does not match client_id".to_string(),
                ));
            }
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::jwk::{decode_public_key, encode_public_key};
    use crate::oauth::test_support::{OTHER_KEY, TEST_AUDIENCE, TEST_KEY, assertion_claims};
    use chrono::Utc;
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
    use serde_json::json;

    const CLIENT_ID: &str = "mock_id_v1";

    fn verifier() -> ClientAssertionVerifier {
        ClientAssertionVerifier::new(TEST_AUDIENCE, Duration::from_secs(30))
    }

    fn stored_key() -> ClientPublicKey {
        decode_public_key(&encode_public_key(&TEST_KEY.public_jwk()).unwrap()).unwrap()
    }

    fn assert_rejected(result: Result<ClientAssertionClaims, TokenRequestError>, reason: &str) {
        match result {
            Err(TokenRequestError::InvalidClientAssertion(message)) => {
                assert!(
                    message.contains(reason),
                    "expected '{}' in '{}'",
                    reason,
                    message
                );
            }
            other => panic!("expected InvalidClientAssertion, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_assertion() {
        let claims = verifier()
            .verify(&TEST_KEY.assertion(CLIENT_ID), CLIENT_ID, &stored_key())
            .unwrap();
        assert_eq!(claims.iss, CLIENT_ID);
        assert_eq!(claims.aud, Audience::Single(TEST_AUDIENCE.to_string()));
    }

    #[test]
    fn test_stored_key_verifies_like_submitted_key() {
        // The raw key and the stored round-tripped key accept the same assertion.
        let raw = decode_public_key(&serde_json::Value::Object(TEST_KEY.public_jwk()).to_string())
            .unwrap();
        let assertion = TEST_KEY.assertion(CLIENT_ID);
        assert_eq!(
            verifier().verify(&assertion, CLIENT_ID, &raw).unwrap(),
            verifier().verify(&assertion, CLIENT_ID, &stored_key()).unwrap()
        );

        let forged = OTHER_KEY.assertion(CLIENT_ID);
        assert!(verifier().verify(&forged, CLIENT_ID, &raw).is_err());
        assert!(verifier().verify(&forged, CLIENT_ID, &stored_key()).is_err());
    }

    #[test]
    fn test_audience_array() {
        let mut claims = assertion_claims(CLIENT_ID);
        claims["aud"] = json!(["https://other.example.com", TEST_AUDIENCE]);
        let assertion = TEST_KEY.sign(Algorithm::PS256, &claims);
        let verified = verifier().verify(&assertion, CLIENT_ID, &stored_key()).unwrap();
        assert!(matches!(verified.aud, Audience::Multiple(ref values) if values.len() == 2));
    }

    #[test]
    fn test_wrong_signing_key() {
        let assertion = OTHER_KEY.assertion(CLIENT_ID);
        assert_rejected(
            verifier().verify(&assertion, CLIENT_ID, &stored_key()),
            "signature",
        );
    }

    #[test]
    fn test_expired_assertion() {
        let mut claims = assertion_claims(CLIENT_ID);
        claims["exp"] = json!(Utc::now().timestamp() - 120);
        let assertion = TEST_KEY.sign(Algorithm::RS256, &claims);
        assert_rejected(
            verifier().verify(&assertion, CLIENT_ID, &stored_key()),
            "expired",
        );
    }

    #[test]
    fn test_expiry_within_leeway() {
        let mut claims = assertion_claims(CLIENT_ID);
        claims["exp"] = json!(Utc::now().timestamp() - 5);
        let assertion = TEST_KEY.sign(Algorithm::RS256, &claims);
        assert!(verifier().verify(&assertion, CLIENT_ID, &stored_key()).is_ok());
    }

    #[test]
    fn test_future_not_before() {
        let mut claims = assertion_claims(CLIENT_ID);
        claims["nbf"] = json!(Utc::now().timestamp() + 120);
        let assertion = TEST_KEY.sign(Algorithm::RS256, &claims);
        assert_rejected(
            verifier().verify(&assertion, CLIENT_ID, &stored_key()),
            "not yet valid",
        );
    }

    #[test]
    fn test_wrong_audience() {
        let mut claims = assertion_claims(CLIENT_ID);
        claims["aud"] = json!("https://elsewhere.example.com/token");
        let assertion = TEST_KEY.sign(Algorithm::RS256, &claims);
        assert_rejected(
            verifier().verify(&assertion, CLIENT_ID, &stored_key()),
            "audience",
        );
    }

    #[test]
    fn test_issuer_must_be_client_id() {
        let assertion = TEST_KEY.assertion("someone_else");
        assert_rejected(
            verifier().verify(&assertion, CLIENT_ID, &stored_key()),
            "issuer",
        );
    }

    #[test]
    fn test_subject_must_be_client_id() {
        let mut claims = assertion_claims(CLIENT_ID);
        claims["sub"] = json!("someone_else");
        let assertion = TEST_KEY.sign(Algorithm::RS256, &claims);
        assert_rejected(
            verifier().verify(&assertion, CLIENT_ID, &stored_key()),
            "subject",
        );
    }

    #[test]
    fn test_missing_expiry() {
        let mut claims = assertion_claims(CLIENT_ID);
        claims.as_object_mut().unwrap().remove("exp");
        let assertion = TEST_KEY.sign(Algorithm::RS256, &claims);
        assert!(verifier().verify(&assertion, CLIENT_ID, &stored_key()).is_err());
    }

    #[test]
    fn test_hmac_assertion_rejected() {
        let assertion = encode(
            &Header::new(Algorithm::HS256),
            &assertion_claims(CLIENT_ID),
            &EncodingKey::from_secret(b"shared-secret"),
        )
        .unwrap();
        assert_rejected(
            verifier().verify(&assertion, CLIENT_ID, &stored_key()),
            "not accepted",
        );
    }

    #[test]
    fn test_garbage_assertion() {
        assert_rejected(
            verifier().verify("not.a.jwt", CLIENT_ID, &stored_key()),
            "Malformed",
        );
    }
}
