//! Environment-based configuration types for IdP server runtime settings.

use anyhow::Result;
use std::time::Duration;

use crate::errors::ConfigError;
use crate::oauth::types::{AUTHORIZATION_CODE, JWT_BEARER_ASSERTION_TYPE, PRIVATE_KEY_JWT};

/// Token endpoint path appended to the external base when no audience is configured
pub const TOKEN_ENDPOINT_PATH: &str = "/oauth/token";

/// HTTP server port configuration
#[derive(Clone)]
pub struct HttpPort(u16);

/// Comma-separated list of recognized protocol literals
#[derive(Clone, Debug)]
pub struct SupportedValues(Vec<String>);

/// Allowed clock skew when checking client assertion validity windows
#[derive(Clone)]
pub struct ClientAssertionLeeway(Duration);

/// Lifetime of a cached client detail entry
#[derive(Clone)]
pub struct ClientCacheTtl(Duration);

/// Client management API toggle
#[derive(Clone)]
pub struct EnableClientApi(bool);

/// Main application configuration
#[derive(Clone)]
pub struct Config {
    pub version: String,
    pub http_port: HttpPort,
    pub external_base: String,
    pub token_endpoint_audience: String,
    pub supported_grant_types: SupportedValues,
    pub supported_client_assertion_types: SupportedValues,
    pub supported_client_auth_methods: SupportedValues,
    pub client_assertion_leeway: ClientAssertionLeeway,
    pub client_cache_ttl: ClientCacheTtl,
    pub storage_backend: String,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub enable_client_api: EnableClientApi,
}

impl Config {
    /// Create a new configuration from environment variables
    pub fn new() -> Result<Self> {
        let http_port: HttpPort = default_env("HTTP_PORT", "8080").try_into()?;
        let external_base = require_env("EXTERNAL_BASE")?;
        let external_base = external_base.trim_end_matches('/').to_string();
        url::Url::parse(&external_base).map_err(|e| {
            ConfigError::InvalidUrl("EXTERNAL_BASE".to_string(), e.to_string())
        })?;

        let token_endpoint_audience = optional_env("TOKEN_ENDPOINT_AUDIENCE")
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| format!("{}{}", external_base, TOKEN_ENDPOINT_PATH));

        let supported_grant_types = SupportedValues::parse(
            "SUPPORTED_GRANT_TYPES",
            &default_env("SUPPORTED_GRANT_TYPES", AUTHORIZATION_CODE),
        )?;
        let supported_client_assertion_types = SupportedValues::parse(
            "SUPPORTED_CLIENT_ASSERTION_TYPES",
            &default_env("SUPPORTED_CLIENT_ASSERTION_TYPES", JWT_BEARER_ASSERTION_TYPE),
        )?;
        let supported_client_auth_methods = SupportedValues::parse(
            "SUPPORTED_CLIENT_AUTH_METHODS",
            &default_env("SUPPORTED_CLIENT_AUTH_METHODS", PRIVATE_KEY_JWT),
        )?;

        let client_assertion_leeway: ClientAssertionLeeway =
            default_env("CLIENT_ASSERTION_LEEWAY", "30s").try_into()?;
        let client_cache_ttl: ClientCacheTtl = default_env("CLIENT_CACHE_TTL", "1h").try_into()?;
        let storage_backend = default_env("STORAGE_BACKEND", "memory");
        let database_url = optional_env("DATABASE_URL");
        let redis_url = optional_env("REDIS_URL").filter(|value| !value.is_empty());
        let enable_client_api: EnableClientApi =
            default_env("ENABLE_CLIENT_API", "false").try_into()?;

        Ok(Self {
            version: version()?,
            http_port,
            external_base,
            token_endpoint_audience,
            supported_grant_types,
            supported_client_assertion_types,
            supported_client_auth_methods,
            client_assertion_leeway,
            client_cache_ttl,
            storage_backend,
            database_url,
            redis_url,
            enable_client_api,
        })
    }
}

/// Get application version from build environment
pub fn version() -> Result<String> {
    option_env!("GIT_HASH")
        .or(option_env!("CARGO_PKG_VERSION"))
        .map(|val| val.to_string())
        .ok_or(ConfigError::VersionNotSet.into())
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| ConfigError::EnvVarRequired(name.to_string()).into())
}

pub(crate) fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn default_env(name: &str, default_value: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default_value.to_string())
}

fn parse_duration(value: String) -> Result<Duration, ConfigError> {
    duration_str::parse(&value).map_err(|e| ConfigError::DurationParsingFailed(value, e.to_string()))
}

impl TryFrom<String> for HttpPort {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            Ok(Self(8080))
        } else {
            value
                .parse::<u16>()
                .map(Self)
                .map_err(|err| ConfigError::PortParsingFailed(err).into())
        }
    }
}

impl AsRef<u16> for HttpPort {
    fn as_ref(&self) -> &u16 {
        &self.0
    }
}

impl SupportedValues {
    /// Parse a comma-separated list, rejecting an empty result
    pub fn parse(name: &str, value: &str) -> Result<Self, ConfigError> {
        let values = value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<String>>();

        if values.is_empty() {
            return Err(ConfigError::EmptyValueList(name.to_string()));
        }

        Ok(Self(values))
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|v| v == value)
    }
}

impl From<Vec<String>> for SupportedValues {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}

impl AsRef<Vec<String>> for SupportedValues {
    fn as_ref(&self) -> &Vec<String> {
        &self.0
    }
}

impl TryFrom<String> for ClientAssertionLeeway {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ok(Self(parse_duration(value)?))
    }
}

impl AsRef<Duration> for ClientAssertionLeeway {
    fn as_ref(&self) -> &Duration {
        &self.0
    }
}

impl TryFrom<String> for ClientCacheTtl {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ok(Self(parse_duration(value)?))
    }
}

impl AsRef<Duration> for ClientCacheTtl {
    fn as_ref(&self) -> &Duration {
        &self.0
    }
}

impl TryFrom<String> for EnableClientApi {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Self(true)),
            "false" | "0" | "no" | "off" | "" => Ok(Self(false)),
            _ => Err(ConfigError::BoolParsingFailed(value).into()),
        }
    }
}

impl AsRef<bool> for EnableClientApi {
    fn as_ref(&self) -> &bool {
        &self.0
    }
}
