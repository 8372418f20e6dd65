//! OIDC client management.
//!
//! Registry of relying-party clients with cache-backed active client lookup.

pub mod registry;

pub use registry::ClientRegistry;
