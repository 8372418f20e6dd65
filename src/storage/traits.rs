//! Storage trait definitions for client records and the client detail cache.
//!
//! Defines async interfaces that can be implemented by in-memory, SQL, and
//! Redis backends.

use async_trait::async_trait;

use crate::errors::{CacheError, StorageError};
use crate::oauth::types::{ClientDetail, ClientStatus};
use crate::storage::client_record::ClientRecord;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Durable keyed storage of client registration records
#[async_trait]
pub trait ClientRecordStore: Send + Sync {
    /// Retrieve a client record by ID
    async fn find_client(&self, client_id: &str) -> Result<Option<ClientRecord>>;

    /// Retrieve a client record by ID only if it has the given status
    async fn find_client_with_status(
        &self,
        client_id: &str,
        status: ClientStatus,
    ) -> Result<Option<ClientRecord>>;

    /// Insert a new record, failing with `StorageError::AlreadyExists` if the ID is taken
    async fn insert_client(&self, record: &ClientRecord) -> Result<ClientRecord>;

    /// Overwrite an existing record, failing with `StorageError::NotFound` if it is missing
    async fn save_client(&self, record: &ClientRecord) -> Result<ClientRecord>;
}

/// Proof that a lookup missed, tied to the key's eviction generation at that moment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheTicket {
    pub client_id: String,
    pub generation: u64,
}

/// Outcome of a cache lookup
#[derive(Debug, Clone)]
pub enum CacheLookup {
    Hit(ClientDetail),
    Miss(CacheTicket),
}

/// Read-through cache of active client details keyed by client ID
#[async_trait]
pub trait ClientDetailCache: Send + Sync {
    /// Look up a client, returning a fill ticket on miss
    async fn lookup(&self, client_id: &str) -> std::result::Result<CacheLookup, CacheError>;

    /// Install a detail for a missed key. Returns false when the key was
    /// evicted after the ticket was issued and the value was discarded.
    async fn fill(
        &self,
        ticket: CacheTicket,
        detail: &ClientDetail,
    ) -> std::result::Result<bool, CacheError>;

    /// Remove any entry for the key and invalidate outstanding tickets
    async fn evict(&self, client_id: &str) -> std::result::Result<(), CacheError>;
}
