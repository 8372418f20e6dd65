//! In-memory client record storage implementation

use crate::errors::StorageError;
use crate::oauth::types::ClientStatus;
use crate::storage::client_record::ClientRecord;
use crate::storage::traits::*;
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Mutex;

/// In-memory implementation of `ClientRecordStore`
#[derive(Default)]
pub struct MemoryClientStore {
    clients: Mutex<HashMap<String, ClientRecord>>,
}

impl MemoryClientStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientRecordStore for MemoryClientStore {
    async fn find_client(&self, client_id: &str) -> Result<Option<ClientRecord>> {
        let clients = self
            .clients
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;
        Ok(clients.get(client_id).cloned())
    }

    async fn find_client_with_status(
        &self,
        client_id: &str,
        status: ClientStatus,
    ) -> Result<Option<ClientRecord>> {
        let clients = self
            .clients
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;
        Ok(clients
            .get(client_id)
            .filter(|record| record.status == status.as_str())
            .cloned())
    }

    async fn insert_client(&self, record: &ClientRecord) -> Result<ClientRecord> {
        let mut clients = self
            .clients
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;
        match clients.entry(record.id.clone()) {
            Entry::Occupied(_) => Err(StorageError::AlreadyExists(record.id.clone())),
            Entry::Vacant(slot) => Ok(slot.insert(record.clone()).clone()),
        }
    }

    async fn save_client(&self, record: &ClientRecord) -> Result<ClientRecord> {
        let mut clients = self
            .clients
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))?;
        match clients.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(record.clone())
            }
            None => Err(StorageError::NotFound(record.id.clone())),
        }
    }
}
