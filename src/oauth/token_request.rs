//! Token request validation for clients authenticating with `private_key_jwt`.
//!
//! A `TokenForm` is first converted into a structurally valid `TokenRequest`.
//! The validator then checks the configured protocol literals, resolves the
//! client, authorizes grant type and assertion method, verifies the client
//! assertion, and finally checks the redirect URI against the registration.

use serde::Deserialize;
use url::Url;

use crate::config::{Config, SupportedValues};
use crate::errors::TokenRequestError;
use crate::oauth::clients::ClientRegistry;
use crate::oauth::jwt::{ClientAssertionClaims, ClientAssertionVerifier};
use crate::oauth::types::{ClientDetail, JWT_BEARER_ASSERTION_TYPE, PRIVATE_KEY_JWT};

/// Token endpoint form fields as received
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenForm {
    pub grant_type: Option<String>,
    pub code: Option<String>,
    pub client_id: Option<String>,
    pub redirect_uri: Option<String>,
    /// Should be "urn:ietf:params:oauth:client-assertion-type:jwt-bearer"
    pub client_assertion_type: Option<String>,
    /// JWT client assertion for private_key_jwt authentication (RFC 7523)
    pub client_assertion: Option<String>,
}

/// Structurally valid token request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequest {
    pub grant_type: String,
    pub code: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub client_assertion_type: String,
    pub client_assertion: String,
}

impl TryFrom<TokenForm> for TokenRequest {
    type Error = TokenRequestError;

    fn try_from(form: TokenForm) -> Result<Self, Self::Error> {
        let redirect_uri = required("redirect_uri", form.redirect_uri)?;
        Url::parse(&redirect_uri).map_err(|e| {
            TokenRequestError::InvalidRequest(format!("redirect_uri is not a valid URL: {}", e))
        })?;

        Ok(Self {
            grant_type: required("grant_type", form.grant_type)?,
            code: required("code", form.code)?,
            client_id: required("client_id", form.client_id)?,
            redirect_uri,
            client_assertion_type: required("client_assertion_type", form.client_assertion_type)?,
            client_assertion: required("client_assertion", form.client_assertion)?,
        })
    }
}

fn required(field: &str, value: Option<String>) -> Result<String, TokenRequestError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(TokenRequestError::InvalidRequest(format!(
            "{} must not be blank",
            field
        ))),
    }
}

/// Protocol literals this IdP recognizes
#[derive(Debug, Clone)]
pub struct TokenRequestPolicy {
    pub supported_grant_types: SupportedValues,
    pub supported_client_assertion_types: SupportedValues,
    pub supported_client_auth_methods: SupportedValues,
}

impl From<&Config> for TokenRequestPolicy {
    fn from(config: &Config) -> Self {
        Self {
            supported_grant_types: config.supported_grant_types.clone(),
            supported_client_assertion_types: config.supported_client_assertion_types.clone(),
            supported_client_auth_methods: config.supported_client_auth_methods.clone(),
        }
    }
}

impl TokenRequestPolicy {
    /// Reject literals outside the configured sets
    pub fn check(&self, request: &TokenRequest) -> Result<(), TokenRequestError> {
        if !self.supported_grant_types.contains(&request.grant_type) {
            return Err(TokenRequestError::InvalidRequest(format!(
                "Unsupported grant_type: {}",
                request.grant_type
            )));
        }
        if !self
            .supported_client_assertion_types
            .contains(&request.client_assertion_type)
        {
            return Err(TokenRequestError::InvalidRequest(format!(
                "Unsupported client_assertion_type: {}",
                request.client_assertion_type
            )));
        }
        Ok(())
    }

    /// Client authentication method implied by an assertion type
    fn auth_method_for(&self, client_assertion_type: &str) -> Option<&'static str> {
        match client_assertion_type {
            JWT_BEARER_ASSERTION_TYPE if self.supported_client_auth_methods.contains(PRIVATE_KEY_JWT) => {
                Some(PRIVATE_KEY_JWT)
            }
            _ => None,
        }
    }
}

/// A token request that passed every check, ready for token issuance
#[derive(Debug, Clone)]
pub struct AcceptedTokenRequest {
    pub request: TokenRequest,
    pub client: ClientDetail,
    pub assertion: ClientAssertionClaims,
}

/// Validates token requests against registered clients
#[derive(Clone)]
pub struct TokenRequestValidator {
    registry: ClientRegistry,
    verifier: ClientAssertionVerifier,
    policy: TokenRequestPolicy,
}

impl TokenRequestValidator {
    pub fn new(
        registry: ClientRegistry,
        verifier: ClientAssertionVerifier,
        policy: TokenRequestPolicy,
    ) -> Self {
        Self {
            registry,
            verifier,
            policy,
        }
    }

    pub fn from_config(registry: ClientRegistry, config: &Config) -> Self {
        let verifier = ClientAssertionVerifier::new(
            config.token_endpoint_audience.clone(),
            *config.client_assertion_leeway.as_ref(),
        );
        Self::new(registry, verifier, TokenRequestPolicy::from(config))
    }

    /// Audience client assertions must carry
    pub fn audience(&self) -> &str {
        self.verifier.audience()
    }

    /// Pre-validate raw form fields, then run the full validation
    pub async fn validate_form(
        &self,
        form: TokenForm,
    ) -> Result<AcceptedTokenRequest, TokenRequestError> {
        let request = TokenRequest::try_from(form)?;
        self.validate(request).await
    }

    /// Validate a structurally valid request; read-only
    pub async fn validate(
        &self,
        request: TokenRequest,
    ) -> Result<AcceptedTokenRequest, TokenRequestError> {
        let result = self.run_checks(&request).await;
        match &result {
            Ok(_) => {
                tracing::info!(client_id = %request.client_id, "token request accepted");
            }
            Err(e) => {
                tracing::info!(client_id = %request.client_id, error = %e, "token request rejected");
            }
        }
        result.map(|(client, assertion)| AcceptedTokenRequest {
            request,
            client,
            assertion,
        })
    }

    async fn run_checks(
        &self,
        request: &TokenRequest,
    ) -> Result<(ClientDetail, ClientAssertionClaims), TokenRequestError> {
        self.policy.check(request)?;

        let client = self
            .registry
            .get_active_client(&request.client_id)
            .await
            .map_err(|e| {
                tracing::debug!(client_id = %request.client_id, error = ?e, "client resolution failed");
                TokenRequestError::InvalidClient
            })?;

        if !client.allows_grant_type(&request.grant_type) {
            return Err(TokenRequestError::UnauthorizedClient(format!(
                "grant_type {} is not allowed for this client",
                request.grant_type
            )));
        }

        let auth_method = self
            .policy
            .auth_method_for(&request.client_assertion_type)
            .filter(|method| client.allows_auth_method(method))
            .ok_or_else(|| {
                TokenRequestError::UnauthorizedClient(format!(
                    "client_assertion_type {} is not allowed for this client",
                    request.client_assertion_type
                ))
            })?;
        tracing::debug!(client_id = %request.client_id, auth_method, "client auth method authorized");

        let public_key = client.decoded_public_key().map_err(|e| {
            tracing::error!(client_id = %request.client_id, error = ?e, "stored client public key is unusable");
            TokenRequestError::InvalidClientAssertion("client public key is unusable".to_string())
        })?;

        let assertion =
            self.verifier
                .verify(&request.client_assertion, &request.client_id, &public_key)?;

        if !client.has_redirect_uri(&request.redirect_uri) {
            return Err(TokenRequestError::InvalidRequest(
                "redirect_uri is not registered for this client".to_string(),
            ));
        }

        Ok((client, assertion))
    }
}
