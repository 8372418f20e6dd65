//! OIDC client credential handling: client registry, JWK codec, client
//! assertion verification, and token request validation.

pub mod clients;
pub mod jwk;
pub mod jwt;
pub mod token_request;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export frequently used items from each module
pub use clients::ClientRegistry;
pub use jwk::{ClientPublicKey, RsaJwk, decode_public_key, encode_public_key, jwk_thumbprint};
pub use jwt::{Audience, ClientAssertionClaims, ClientAssertionVerifier};
pub use token_request::{
    AcceptedTokenRequest, TokenForm, TokenRequest, TokenRequestPolicy, TokenRequestValidator,
};
pub use types::{
    AUTHORIZATION_CODE, ClientCreateRequest, ClientDetail, ClientResponse, ClientStatus,
    ClientUpdateRequest, JWT_BEARER_ASSERTION_TYPE, PRIVATE_KEY_JWT, strip_nulls,
};
