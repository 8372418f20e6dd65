//! Standardized error types following the `error-idp-<domain>-<number>` format.

use thiserror::Error;

/// Configuration errors that occur during application startup
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Error when a required environment variable is not set
    #[error("error-idp-config-1 {0} must be set")]
    EnvVarRequired(String),

    /// Error when PORT cannot be parsed
    #[error("error-idp-config-2 Parsing PORT into u16 failed: {0:?}")]
    PortParsingFailed(std::num::ParseIntError),

    /// Error when version information is not available
    #[error("error-idp-config-3 One of GIT_HASH or CARGO_PKG_VERSION must be set")]
    VersionNotSet,

    /// Error when duration string cannot be parsed
    #[error("error-idp-config-4 Failed to parse duration '{0}': {1}")]
    DurationParsingFailed(String, String),

    /// Error when boolean string cannot be parsed
    #[error(
        "error-idp-config-5 Failed to parse boolean '{0}': expected true/false/1/0/yes/no/on/off"
    )]
    BoolParsingFailed(String),

    /// Error when a list of recognized protocol values is empty
    #[error("error-idp-config-6 {0} must contain at least one value")]
    EmptyValueList(String),

    /// Error when a URL setting cannot be parsed
    #[error("error-idp-config-7 Invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
}

/// JSON Web Key errors
#[derive(Debug, Error)]
pub enum JwkError {
    /// Key material is not a usable RSA public key
    #[error("error-idp-jwk-1 Invalid public key: {0}")]
    InvalidPublicKey(String),
}

/// Client registry errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Structurally malformed management request
    #[error("error-idp-client-1 Invalid request: {0}")]
    InvalidRequest(String),

    /// A client with the same identifier is already registered
    #[error("error-idp-client-2 Duplicate client id: {0}")]
    DuplicateClientId(String),

    /// No client is registered under the identifier
    #[error("error-idp-client-3 Invalid client id: {0}")]
    InvalidClientId(String),

    /// No active, readable client is registered under the identifier
    #[error("error-idp-client-4 Invalid client")]
    InvalidClient,

    /// Supplied public key is not a valid RSA JWK
    #[error("error-idp-client-5 Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Persistence failure
    #[error("error-idp-client-6 Storage failure: {0}")]
    Storage(#[from] StorageError),

    /// Cache invalidation failure after a committed write
    #[error("error-idp-client-7 Cache failure: {0}")]
    Cache(#[from] CacheError),
}

impl ClientError {
    /// OAuth-style error code exposed to API callers
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::InvalidRequest(_) => "invalid_request",
            ClientError::DuplicateClientId(_) => "duplicate_client_id",
            ClientError::InvalidClientId(_) => "invalid_client_id",
            ClientError::InvalidClient => "invalid_client",
            ClientError::InvalidPublicKey(_) => "invalid_public_key",
            ClientError::Storage(_) | ClientError::Cache(_) => "server_error",
        }
    }
}

impl From<JwkError> for ClientError {
    fn from(err: JwkError) -> Self {
        match err {
            JwkError::InvalidPublicKey(reason) => ClientError::InvalidPublicKey(reason),
        }
    }
}

/// Token request validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenRequestError {
    /// Structurally malformed request or unregistered redirect URI
    #[error("error-idp-token-1 Invalid request: {0}")]
    InvalidRequest(String),

    /// Client is unknown, inactive, or unreadable
    #[error("error-idp-token-2 Invalid client")]
    InvalidClient,

    /// Client is not permitted to use the grant type or assertion method
    #[error("error-idp-token-3 Unauthorized client: {0}")]
    UnauthorizedClient(String),

    /// Client assertion signature, issuer, audience, or validity window check failed
    #[error("error-idp-token-4 Invalid client assertion: {0}")]
    InvalidClientAssertion(String),
}

impl TokenRequestError {
    /// OAuth-style error code exposed to API callers
    pub fn error_code(&self) -> &'static str {
        match self {
            TokenRequestError::InvalidRequest(_) => "invalid_request",
            TokenRequestError::InvalidClient => "invalid_client",
            TokenRequestError::UnauthorizedClient(_) => "unauthorized_client",
            TokenRequestError::InvalidClientAssertion(_) => "invalid_client_assertion",
        }
    }
}

/// Database/storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Error when database connection fails
    #[error("error-idp-storage-1 Database connection failed: {0}")]
    ConnectionFailed(String),

    /// Error when data serialization fails
    #[error("error-idp-storage-2 Data serialization failed: {0}")]
    SerializationFailed(String),

    /// Error when database operation fails
    #[error("error-idp-storage-3 Database error: {0}")]
    DatabaseError(String),

    /// Error when stored data cannot be read back
    #[error("error-idp-storage-4 Invalid data: {0}")]
    InvalidData(String),

    /// Error when requested resource is not found
    #[error("error-idp-storage-5 Not found: {0}")]
    NotFound(String),

    /// Error when a conditional insert finds an existing record
    #[error("error-idp-storage-6 Already exists: {0}")]
    AlreadyExists(String),
}

/// Client detail cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    /// Error when the cache backend cannot be reached
    #[error("error-idp-cache-1 Cache connection failed: {0}")]
    ConnectionFailed(String),

    /// Error when a cache command fails
    #[error("error-idp-cache-2 Cache operation failed: {0}")]
    OperationFailed(String),

    /// Error when a cached value cannot be (de)serialized
    #[error("error-idp-cache-3 Cache serialization failed: {0}")]
    SerializationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_codes_are_contiguous() {
        let errors = [
            StorageError::ConnectionFailed("x".to_string()),
            StorageError::SerializationFailed("x".to_string()),
            StorageError::DatabaseError("x".to_string()),
            StorageError::InvalidData("x".to_string()),
            StorageError::NotFound("x".to_string()),
            StorageError::AlreadyExists("x".to_string()),
        ];
        for (index, error) in errors.iter().enumerate() {
            let prefix = format!("error-idp-storage-{} ", index + 1);
            assert!(error.to_string().starts_with(&prefix), "{}", error);
        }
    }
}
