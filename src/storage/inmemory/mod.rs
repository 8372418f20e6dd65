//! In-memory storage implementations
//!
//! This module provides in-memory implementations of the client record store
//! and the client detail cache. These are the defaults for development and tests.

mod cache;
mod clients;

pub use cache::MemoryClientCache;
pub use clients::MemoryClientStore;
