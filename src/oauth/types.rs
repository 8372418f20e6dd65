//! OIDC client registration types and data structures.
//!
//! Defines the management request payloads, the client status lifecycle, and the
//! in-memory `ClientDetail` view served by the client registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{ClientError, JwkError};
use crate::oauth::jwk::{ClientPublicKey, decode_public_key};

/// Authorization code grant type literal
pub const AUTHORIZATION_CODE: &str = "authorization_code";

/// Client assertion type for JWT bearer client authentication (RFC 7523)
pub const JWT_BEARER_ASSERTION_TYPE: &str =
    "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Client authentication method backed by a signed JWT assertion
pub const PRIVATE_KEY_JWT: &str = "private_key_jwt";

// Column widths of the client_detail table
pub const MAX_CLIENT_ID_LENGTH: usize = 100;
pub const MAX_CLIENT_NAME_LENGTH: usize = 256;
pub const MAX_RELYING_PARTY_ID_LENGTH: usize = 100;
pub const MAX_LOGO_URI_LENGTH: usize = 2048;

/// Registration status of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    Active,
    Inactive,
}

impl ClientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Active => "active",
            ClientStatus::Inactive => "inactive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(ClientStatus::Active),
            "inactive" => Some(ClientStatus::Inactive),
            _ => None,
        }
    }
}

impl std::fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Client registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientCreateRequest {
    pub client_id: String,
    pub client_name: String,
    pub relying_party_id: String,
    pub logo_uri: String,
    /// RSA public key as a JWK object
    pub public_key: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub redirect_uris: Vec<Option<String>>,
    #[serde(default)]
    pub user_claims: Vec<Option<String>>,
    #[serde(default)]
    pub auth_context_refs: Vec<Option<String>>,
    #[serde(default)]
    pub grant_types: Vec<Option<String>>,
    #[serde(default)]
    pub client_auth_methods: Vec<Option<String>>,
}

impl ClientCreateRequest {
    /// Structural checks performed before the registry touches storage
    pub fn validate(&self) -> Result<(), ClientError> {
        require_non_blank("client_id", &self.client_id)?;
        require_max_length("client_id", &self.client_id, MAX_CLIENT_ID_LENGTH)?;
        require_non_blank("client_name", &self.client_name)?;
        require_max_length("client_name", &self.client_name, MAX_CLIENT_NAME_LENGTH)?;
        require_non_blank("relying_party_id", &self.relying_party_id)?;
        require_max_length(
            "relying_party_id",
            &self.relying_party_id,
            MAX_RELYING_PARTY_ID_LENGTH,
        )?;
        require_url("logo_uri", &self.logo_uri)?;
        require_max_length("logo_uri", &self.logo_uri, MAX_LOGO_URI_LENGTH)?;
        if self.public_key.is_empty() {
            return Err(ClientError::InvalidRequest(
                "public_key must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Client update request. The public key is not part of an update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientUpdateRequest {
    pub client_name: String,
    pub logo_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<Option<String>>,
    #[serde(default)]
    pub user_claims: Vec<Option<String>>,
    #[serde(default)]
    pub auth_context_refs: Vec<Option<String>>,
    #[serde(default)]
    pub grant_types: Vec<Option<String>>,
    #[serde(default)]
    pub client_auth_methods: Vec<Option<String>>,
    pub status: String,
}

impl ClientUpdateRequest {
    /// Structural checks; returns the requested status on success
    pub fn validate(&self) -> Result<ClientStatus, ClientError> {
        require_non_blank("client_name", &self.client_name)?;
        require_max_length("client_name", &self.client_name, MAX_CLIENT_NAME_LENGTH)?;
        require_url("logo_uri", &self.logo_uri)?;
        require_max_length("logo_uri", &self.logo_uri, MAX_LOGO_URI_LENGTH)?;
        ClientStatus::parse(&self.status).ok_or_else(|| {
            ClientError::InvalidRequest(format!("Unsupported client status: {}", self.status))
        })
    }
}

/// Result of a create or update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientResponse {
    pub client_id: String,
    pub status: ClientStatus,
}

/// In-memory view of a registered client, derived from the stored record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDetail {
    pub client_id: String,
    pub name: String,
    pub relying_party_id: String,
    pub logo_uri: String,
    /// RSA public key as JWK JSON text
    pub public_key: String,
    pub redirect_uris: Vec<String>,
    pub claims: Vec<String>,
    pub acr_values: Vec<String>,
    pub grant_types: Vec<String>,
    pub client_auth_methods: Vec<String>,
    pub status: ClientStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ClientDetail {
    /// Decode the stored JWK into a key usable for signature verification
    pub fn decoded_public_key(&self) -> Result<ClientPublicKey, JwkError> {
        decode_public_key(&self.public_key)
    }

    pub fn allows_grant_type(&self, grant_type: &str) -> bool {
        self.grant_types.iter().any(|value| value == grant_type)
    }

    pub fn allows_auth_method(&self, method: &str) -> bool {
        self.client_auth_methods.iter().any(|value| value == method)
    }

    /// Exact string match against the registered redirect URIs
    pub fn has_redirect_uri(&self, redirect_uri: &str) -> bool {
        self.redirect_uris.iter().any(|value| value == redirect_uri)
    }
}

/// Drop null entries while keeping the order of the rest
pub fn strip_nulls<I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<String>>,
{
    values.into_iter().flatten().collect()
}

fn require_non_blank(field: &str, value: &str) -> Result<(), ClientError> {
    if value.trim().is_empty() {
        return Err(ClientError::InvalidRequest(format!(
            "{} must not be blank",
            field
        )));
    }
    Ok(())
}

fn require_max_length(field: &str, value: &str, max: usize) -> Result<(), ClientError> {
    if value.chars().count() > max {
        return Err(ClientError::InvalidRequest(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

fn require_url(field: &str, value: &str) -> Result<(), ClientError> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| ClientError::InvalidRequest(format!("{} is not a valid URL: {}", field, e)))
}
