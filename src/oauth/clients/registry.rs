//! OIDC client registry.
//!
//! Creates and updates client registrations and serves the active client view
//! through the client detail cache. Every successful write is followed by one
//! eviction of the affected key.

use std::sync::Arc;

use chrono::Utc;

use crate::errors::{ClientError, StorageError};
use crate::oauth::jwk::{decode_public_key, encode_public_key};
use crate::oauth::types::*;
use crate::storage::client_record::{ClientRecord, encode_list};
use crate::storage::traits::{CacheLookup, ClientDetailCache, ClientRecordStore};

/// Client registry backed by a record store and a detail cache
#[derive(Clone)]
pub struct ClientRegistry {
    store: Arc<dyn ClientRecordStore>,
    cache: Arc<dyn ClientDetailCache>,
}

impl ClientRegistry {
    pub fn new(store: Arc<dyn ClientRecordStore>, cache: Arc<dyn ClientDetailCache>) -> Self {
        Self { store, cache }
    }

    /// Register a new client with status `active`
    pub async fn create_client(
        &self,
        request: ClientCreateRequest,
    ) -> Result<ClientResponse, ClientError> {
        request.validate()?;

        let client_id = request.client_id.clone();
        if self.store.find_client(&client_id).await?.is_some() {
            return Err(ClientError::DuplicateClientId(client_id));
        }

        let public_key = encode_public_key(&request.public_key)?;
        let key_thumbprint = decode_public_key(&public_key)?.thumbprint();

        let record = ClientRecord {
            id: client_id.clone(),
            name: request.client_name,
            rp_id: request.relying_party_id,
            logo_uri: request.logo_uri,
            public_key,
            redirect_uris: encode_list(&strip_nulls(request.redirect_uris))?,
            claims: encode_list(&strip_nulls(request.user_claims))?,
            acr_values: encode_list(&strip_nulls(request.auth_context_refs))?,
            grant_types: encode_list(&strip_nulls(request.grant_types))?,
            client_auth_methods: encode_list(&strip_nulls(request.client_auth_methods))?,
            status: ClientStatus::Active.as_str().to_string(),
            created_at: Utc::now(),
            updated_at: None,
        };

        let saved = match self.store.insert_client(&record).await {
            Ok(saved) => saved,
            Err(StorageError::AlreadyExists(_)) => {
                return Err(ClientError::DuplicateClientId(client_id));
            }
            Err(e) => return Err(e.into()),
        };

        self.invalidate(&client_id).await?;

        tracing::info!(client_id = %client_id, key_thumbprint = %key_thumbprint, "registered client");

        Ok(ClientResponse {
            client_id: saved.id,
            status: ClientStatus::Active,
        })
    }

    /// Overwrite the mutable fields of an existing client. The public key is kept.
    pub async fn update_client(
        &self,
        client_id: &str,
        request: ClientUpdateRequest,
    ) -> Result<ClientResponse, ClientError> {
        let status = request.validate()?;

        let existing = self
            .store
            .find_client(client_id)
            .await?
            .ok_or_else(|| ClientError::InvalidClientId(client_id.to_string()))?;

        let record = ClientRecord {
            name: request.client_name,
            logo_uri: request.logo_uri,
            redirect_uris: encode_list(&strip_nulls(request.redirect_uris))?,
            claims: encode_list(&strip_nulls(request.user_claims))?,
            acr_values: encode_list(&strip_nulls(request.auth_context_refs))?,
            grant_types: encode_list(&strip_nulls(request.grant_types))?,
            client_auth_methods: encode_list(&strip_nulls(request.client_auth_methods))?,
            status: status.as_str().to_string(),
            updated_at: Some(Utc::now()),
            ..existing
        };

        let saved = match self.store.save_client(&record).await {
            Ok(saved) => saved,
            Err(StorageError::NotFound(_)) => {
                return Err(ClientError::InvalidClientId(client_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        self.invalidate(client_id).await?;

        tracing::info!(client_id = %client_id, status = %status, "updated client");

        Ok(ClientResponse {
            client_id: saved.id,
            status,
        })
    }

    /// Resolve an active client, reading through the cache
    pub async fn get_active_client(&self, client_id: &str) -> Result<ClientDetail, ClientError> {
        let ticket = match self.cache.lookup(client_id).await {
            Ok(CacheLookup::Hit(detail)) => return Ok(detail),
            Ok(CacheLookup::Miss(ticket)) => Some(ticket),
            Err(e) => {
                tracing::warn!(client_id = %client_id, error = ?e, "client cache lookup failed, reading from store");
                None
            }
        };

        let record = self
            .store
            .find_client_with_status(client_id, ClientStatus::Active)
            .await?
            .ok_or(ClientError::InvalidClient)?;

        let detail = record.to_detail().map_err(|e| {
            tracing::error!(client_id = %client_id, error = ?e, "Failed to parse stored client detail");
            ClientError::InvalidClient
        })?;

        if let Some(ticket) = ticket {
            match self.cache.fill(ticket, &detail).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(client_id = %client_id, "client evicted during lookup, skipped cache fill");
                }
                Err(e) => {
                    tracing::warn!(client_id = %client_id, error = ?e, "failed to cache client detail");
                }
            }
        }

        Ok(detail)
    }

    async fn invalidate(&self, client_id: &str) -> Result<(), ClientError> {
        self.cache.evict(client_id).await.map_err(|e| {
            tracing::error!(client_id = %client_id, error = ?e, "failed to evict cached client after write");
            ClientError::from(e)
        })
    }
}
