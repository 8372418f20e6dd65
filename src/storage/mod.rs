//! Trait-based storage abstractions with in-memory, SQLite, and PostgreSQL
//! client stores and in-memory or Redis client detail caches.

pub mod client_record;
pub mod inmemory;
pub mod traits;

// Feature-gated storage implementations
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "redis")]
pub mod redis;

// Re-export commonly used types and traits
pub use client_record::ClientRecord;
pub use inmemory::{MemoryClientCache, MemoryClientStore};
pub use traits::*;

use crate::errors::{CacheError, StorageError};
use std::sync::Arc;
use std::time::Duration;

/// Storage backend configuration and factory
#[derive(Clone, Debug)]
pub enum StorageBackend {
    Memory,
    #[cfg(feature = "sqlite")]
    Sqlite(String), // Connection string/path
    #[cfg(feature = "postgres")]
    Postgres(String), // Connection string
}

/// Create a client record store based on configuration
pub async fn create_storage_backend(
    backend: StorageBackend,
) -> std::result::Result<Arc<dyn ClientRecordStore>, StorageError> {
    match backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryClientStore::new())),
        #[cfg(feature = "sqlite")]
        StorageBackend::Sqlite(database_url) => {
            let options = database_url
                .parse::<sqlx::sqlite::SqliteConnectOptions>()
                .map_err(|e| {
                    StorageError::ConnectionFailed(format!("Invalid SQLite URL: {}", e))
                })?
                .create_if_missing(true);
            let pool = sqlx::SqlitePool::connect_with(options).await.map_err(|e| {
                StorageError::ConnectionFailed(format!("SQLite connection failed: {}", e))
            })?;

            let storage = sqlite::SqliteClientStore::new(pool);

            // Run migrations
            storage.migrate().await?;

            Ok(Arc::new(storage))
        }
        #[cfg(feature = "postgres")]
        StorageBackend::Postgres(database_url) => {
            let pool = sqlx::postgres::PgPool::connect(&database_url)
                .await
                .map_err(|e| {
                    StorageError::ConnectionFailed(format!("PostgreSQL connection failed: {}", e))
                })?;

            let storage = postgres::PostgresClientStore::new(pool);

            // Run migrations
            storage.migrate().await?;

            Ok(Arc::new(storage))
        }
    }
}

/// Parse storage backend from configuration string
pub fn parse_storage_backend(
    backend_name: &str,
    database_url: Option<&str>,
) -> std::result::Result<StorageBackend, StorageError> {
    match backend_name {
        "memory" => Ok(StorageBackend::Memory),
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let url = database_url.unwrap_or("sqlite:idp.db");
            Ok(StorageBackend::Sqlite(url.to_string()))
        }
        #[cfg(feature = "postgres")]
        "postgres" => {
            let url = database_url.ok_or_else(|| {
                StorageError::InvalidData("DATABASE_URL required for postgres backend".to_string())
            })?;
            Ok(StorageBackend::Postgres(url.to_string()))
        }
        _ => Err(StorageError::InvalidData(format!(
            "Unknown storage backend: {}",
            backend_name
        ))),
    }
}

/// Create the client detail cache: Redis when a URL is configured, otherwise in-memory
pub fn create_client_cache(
    redis_url: Option<&str>,
    ttl: Duration,
) -> std::result::Result<Arc<dyn ClientDetailCache>, CacheError> {
    match redis_url {
        #[cfg(feature = "redis")]
        Some(url) => Ok(Arc::new(self::redis::RedisClientCache::new(url, ttl)?)),
        #[cfg(not(feature = "redis"))]
        Some(_) => Err(CacheError::ConnectionFailed(
            "REDIS_URL is set but the redis feature is not enabled".to_string(),
        )),
        None => Ok(Arc::new(MemoryClientCache::new(ttl))),
    }
}
