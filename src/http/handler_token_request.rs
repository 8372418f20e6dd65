//! Handles POST /oauth/token-request - Authenticates a private_key_jwt token request
//! and hands the accepted request to token issuance

use axum::{Form, Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::context::AppState;
use crate::errors::TokenRequestError;
use crate::oauth::token_request::{AcceptedTokenRequest, TokenForm};

/// Accepted token request as seen by the issuing side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRequestAcceptance {
    pub client_id: String,
    pub grant_type: String,
    pub code: String,
    pub redirect_uri: String,
    pub relying_party_id: String,
    pub claims: Vec<String>,
    pub acr_values: Vec<String>,
    pub assertion_jti: Option<String>,
}

impl From<AcceptedTokenRequest> for TokenRequestAcceptance {
    fn from(accepted: AcceptedTokenRequest) -> Self {
        Self {
            client_id: accepted.request.client_id,
            grant_type: accepted.request.grant_type,
            code: accepted.request.code,
            redirect_uri: accepted.request.redirect_uri,
            relying_party_id: accepted.client.relying_party_id,
            claims: accepted.client.claims,
            acr_values: accepted.client.acr_values,
            assertion_jti: accepted.assertion.jti,
        }
    }
}

pub async fn handle_token_request(
    State(state): State<AppState>,
    Form(form): Form<TokenForm>,
) -> Result<Json<TokenRequestAcceptance>, (StatusCode, Json<Value>)> {
    match state.token_validator.validate_form(form).await {
        Ok(accepted) => Ok(Json(accepted.into())),
        Err(e) => {
            let status = match &e {
                TokenRequestError::InvalidClient | TokenRequestError::InvalidClientAssertion(_) => {
                    StatusCode::UNAUTHORIZED
                }
                TokenRequestError::InvalidRequest(_) | TokenRequestError::UnauthorizedClient(_) => {
                    StatusCode::BAD_REQUEST
                }
            };

            let error_response = json!({
                "error": e.error_code(),
                "error_description": e.to_string()
            });
            Err((status, Json(error_response)))
        }
    }
}
