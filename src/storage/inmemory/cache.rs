//! In-memory client detail cache with per-entry TTL.
//!
//! Each key carries an eviction generation. A miss hands out the current
//! generation in its ticket and a fill is only installed if no eviction has
//! happened since.

use crate::errors::CacheError;
use crate::oauth::types::ClientDetail;
use crate::storage::traits::{CacheLookup, CacheTicket, ClientDetailCache};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct CachedDetail {
    detail: ClientDetail,
    /// `None` when the TTL reaches past what `Instant` can represent
    expires_at: Option<Instant>,
}

impl CachedDetail {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CachedDetail>,
    generations: HashMap<String, u64>,
}

impl CacheState {
    fn generation(&self, client_id: &str) -> u64 {
        self.generations.get(client_id).copied().unwrap_or_default()
    }
}

/// In-memory implementation of `ClientDetailCache`
pub struct MemoryClientCache {
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl MemoryClientCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: Mutex::new(CacheState::default()),
        }
    }
}

#[async_trait]
impl ClientDetailCache for MemoryClientCache {
    async fn lookup(&self, client_id: &str) -> Result<CacheLookup, CacheError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| CacheError::OperationFailed(format!("Lock error: {}", e)))?;

        let now = Instant::now();
        match state.entries.get(client_id) {
            Some(cached) if cached.is_live(now) => {
                return Ok(CacheLookup::Hit(cached.detail.clone()));
            }
            Some(_) => {
                state.entries.remove(client_id);
            }
            None => {}
        }

        Ok(CacheLookup::Miss(CacheTicket {
            client_id: client_id.to_string(),
            generation: state.generation(client_id),
        }))
    }

    async fn fill(&self, ticket: CacheTicket, detail: &ClientDetail) -> Result<bool, CacheError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| CacheError::OperationFailed(format!("Lock error: {}", e)))?;

        if state.generation(&ticket.client_id) != ticket.generation {
            return Ok(false);
        }

        state.entries.insert(
            ticket.client_id,
            CachedDetail {
                detail: detail.clone(),
                expires_at: Instant::now().checked_add(self.ttl),
            },
        );
        Ok(true)
    }

    async fn evict(&self, client_id: &str) -> Result<(), CacheError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| CacheError::OperationFailed(format!("Lock error: {}", e)))?;

        state.entries.remove(client_id);
        *state.generations.entry(client_id.to_string()).or_default() += 1;
        Ok(())
    }
}
