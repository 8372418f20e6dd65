//! Persisted client registration record.
//!
//! List-valued attributes are stored as JSON array-of-string text. Conversion
//! between that text and ordered string sequences happens only here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::StorageError;
use crate::oauth::types::{ClientDetail, ClientStatus};

/// Client registration as held by a `ClientRecordStore`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: String,
    pub name: String,
    pub rp_id: String,
    pub logo_uri: String,
    /// RSA public key as JWK JSON text
    pub public_key: String,
    pub redirect_uris: String,
    pub claims: String,
    pub acr_values: String,
    pub grant_types: String,
    pub client_auth_methods: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ClientRecord {
    pub fn status(&self) -> Result<ClientStatus, StorageError> {
        ClientStatus::parse(&self.status).ok_or_else(|| {
            StorageError::InvalidData(format!(
                "Unknown status '{}' for client {}",
                self.status, self.id
            ))
        })
    }

    /// Materialize the in-memory view, failing on any unreadable list field
    pub fn to_detail(&self) -> Result<ClientDetail, StorageError> {
        Ok(ClientDetail {
            client_id: self.id.clone(),
            name: self.name.clone(),
            relying_party_id: self.rp_id.clone(),
            logo_uri: self.logo_uri.clone(),
            public_key: self.public_key.clone(),
            redirect_uris: decode_list("redirect_uris", &self.redirect_uris)?,
            claims: decode_list("claims", &self.claims)?,
            acr_values: decode_list("acr_values", &self.acr_values)?,
            grant_types: decode_list("grant_types", &self.grant_types)?,
            client_auth_methods: decode_list("client_auth_methods", &self.client_auth_methods)?,
            status: self.status()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Serialize an ordered list as a JSON array of strings
pub fn encode_list(values: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(values)
        .map_err(|e| StorageError::SerializationFailed(format!("Failed to encode list: {}", e)))
}

/// Parse a JSON array of strings
pub fn decode_list(field: &str, text: &str) -> Result<Vec<String>, StorageError> {
    serde_json::from_str::<Vec<String>>(text).map_err(|e| {
        StorageError::InvalidData(format!("Failed to parse json array in {}: {}", field, e))
    })
}
