//! RSA JSON Web Key (RFC 7517) encoding and decoding for client public keys.
//!
//! Keys are validated by building an `rsa::RsaPublicKey` from their components,
//! then re-serialized with only the public RSA members so stored JWK text never
//! carries private parameters.

use base64::{
    Engine,
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use jsonwebtoken::{Algorithm, DecodingKey};
use rsa::{BigUint, RsaPublicKey, traits::PublicKeyParts};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::JwkError;

/// Smallest accepted RSA modulus
pub const MIN_RSA_MODULUS_BITS: usize = 2048;

/// Largest accepted RSA modulus
pub const MAX_RSA_MODULUS_BITS: usize = 16384;

/// Algorithms a client may sign assertions with when its key does not pin one
pub const RSA_SIGNING_ALGORITHMS: [Algorithm; 6] = [
    Algorithm::RS256,
    Algorithm::RS384,
    Algorithm::RS512,
    Algorithm::PS256,
    Algorithm::PS384,
    Algorithm::PS512,
];

const BASE64_URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Public members of an RSA JWK
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsaJwk {
    pub kty: String,
    pub n: String,
    pub e: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
}

/// A decoded client public key ready for signature verification
#[derive(Clone)]
pub struct ClientPublicKey {
    jwk: RsaJwk,
    algorithms: Vec<Algorithm>,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for ClientPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientPublicKey")
            .field("kid", &self.jwk.kid)
            .field("thumbprint", &self.thumbprint())
            .field("algorithms", &self.algorithms)
            .finish()
    }
}

impl ClientPublicKey {
    pub fn jwk(&self) -> &RsaJwk {
        &self.jwk
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    /// Signing algorithms accepted for this key
    pub fn algorithms(&self) -> &[Algorithm] {
        &self.algorithms
    }

    /// RFC 7638 SHA-256 thumbprint
    pub fn thumbprint(&self) -> String {
        jwk_thumbprint(&self.jwk)
    }
}

/// Validate raw key material and return canonical JWK JSON text for storage
pub fn encode_public_key(
    raw: &serde_json::Map<String, serde_json::Value>,
) -> Result<String, JwkError> {
    let jwk = parse_jwk(serde_json::Value::Object(raw.clone()))?;
    let canonical = canonicalize(jwk)?;
    serde_json::to_string(&canonical)
        .map_err(|e| JwkError::InvalidPublicKey(format!("Failed to serialize JWK: {}", e)))
}

/// Parse stored JWK JSON text into a verification key
pub fn decode_public_key(text: &str) -> Result<ClientPublicKey, JwkError> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| JwkError::InvalidPublicKey(format!("Malformed JWK JSON: {}", e)))?;
    let jwk = canonicalize(parse_jwk(value)?)?;

    let algorithms = match &jwk.alg {
        Some(alg) => vec![parse_algorithm(alg)?],
        None => RSA_SIGNING_ALGORITHMS.to_vec(),
    };

    let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
        .map_err(|e| JwkError::InvalidPublicKey(format!("Unusable RSA components: {}", e)))?;

    Ok(ClientPublicKey {
        jwk,
        algorithms,
        decoding_key,
    })
}

/// RFC 7638 thumbprint over the required RSA members in lexicographic order
pub fn jwk_thumbprint(jwk: &RsaJwk) -> String {
    // Base64url members never need JSON escaping.
    let input = format!(r#"{{"e":"{}","kty":"RSA","n":"{}"}}"#, jwk.e, jwk.n);
    BASE64_URL.encode(Sha256::digest(input.as_bytes()))
}

fn parse_jwk(value: serde_json::Value) -> Result<RsaJwk, JwkError> {
    let jwk: RsaJwk = serde_json::from_value(value)
        .map_err(|e| JwkError::InvalidPublicKey(format!("Not an RSA JWK: {}", e)))?;

    if jwk.kty != "RSA" {
        return Err(JwkError::InvalidPublicKey(format!(
            "Unsupported key type: {}",
            jwk.kty
        )));
    }

    match jwk.key_use.as_deref() {
        None | Some("sig") => {}
        Some(other) => {
            return Err(JwkError::InvalidPublicKey(format!(
                "Key use must be sig, got {}",
                other
            )));
        }
    }

    if let Some(alg) = &jwk.alg {
        parse_algorithm(alg)?;
    }

    Ok(jwk)
}

/// Rebuild `n` and `e` from the validated key so equivalent encodings store identically
fn canonicalize(jwk: RsaJwk) -> Result<RsaJwk, JwkError> {
    let n = decode_component("n", &jwk.n)?;
    let e = decode_component("e", &jwk.e)?;

    let key = RsaPublicKey::new_with_max_size(
        BigUint::from_bytes_be(&n),
        BigUint::from_bytes_be(&e),
        MAX_RSA_MODULUS_BITS,
    )
    .map_err(|e| JwkError::InvalidPublicKey(format!("Invalid RSA public key: {}", e)))?;

    if key.size() * 8 < MIN_RSA_MODULUS_BITS {
        return Err(JwkError::InvalidPublicKey(format!(
            "RSA modulus must be at least {} bits",
            MIN_RSA_MODULUS_BITS
        )));
    }

    Ok(RsaJwk {
        n: BASE64_URL.encode(key.n().to_bytes_be()),
        e: BASE64_URL.encode(key.e().to_bytes_be()),
        ..jwk
    })
}

fn decode_component(name: &str, value: &str) -> Result<Vec<u8>, JwkError> {
    if value.is_empty() {
        return Err(JwkError::InvalidPublicKey(format!("Empty {} member", name)));
    }
    BASE64_URL
        .decode(value)
        .map_err(|e| JwkError::InvalidPublicKey(format!("Invalid base64url in {}: {}", name, e)))
}

fn parse_algorithm(alg: &str) -> Result<Algorithm, JwkError> {
    let algorithm: Algorithm = alg
        .parse()
        .map_err(|_| JwkError::InvalidPublicKey(format!("Unknown algorithm: {}", alg)))?;
    if !RSA_SIGNING_ALGORITHMS.contains(&algorithm) {
        return Err(JwkError::InvalidPublicKey(format!(
            "Algorithm {} is not an RSA signing algorithm",
            alg
        )));
    }
    Ok(algorithm)
}
