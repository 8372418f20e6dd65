//! PostgreSQL storage implementations
//!
//! PostgreSQL is the backend for multi-instance deployments sharing one database.

mod clients;

pub use clients::PostgresClientStore;
