//! OIDC identity provider client credential library crate.
//!
//! Registers relying-party clients with their RSA public keys, serves the
//! active client view through a coherent cache, and validates token requests
//! authenticated with `private_key_jwt` client assertions.

pub mod config;
pub mod errors;
pub mod http;
pub mod oauth;
pub mod storage;
