//! Handles the /client-mgmt/oidc-client routes for registering and updating OIDC clients

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::Json as ResponseJson,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{
    errors::ClientError,
    http::context::AppState,
    oauth::types::{ClientCreateRequest, ClientDetail, ClientResponse, ClientUpdateRequest},
};

/// Active client view with the RFC 7638 thumbprint of its key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientView {
    #[serde(flatten)]
    pub client: ClientDetail,
    pub key_thumbprint: String,
}

type HandlerError = (StatusCode, ResponseJson<Value>);

pub async fn create_client_handler(
    State(state): State<AppState>,
    Json(request): Json<ClientCreateRequest>,
) -> Result<ResponseJson<ClientResponse>, HandlerError> {
    state
        .client_registry
        .create_client(request)
        .await
        .map(ResponseJson)
        .map_err(client_error_response)
}

pub async fn update_client_handler(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    Json(request): Json<ClientUpdateRequest>,
) -> Result<ResponseJson<ClientResponse>, HandlerError> {
    state
        .client_registry
        .update_client(&client_id, request)
        .await
        .map(ResponseJson)
        .map_err(client_error_response)
}

pub async fn get_client_handler(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> Result<ResponseJson<ClientView>, HandlerError> {
    let client = state
        .client_registry
        .get_active_client(&client_id)
        .await
        .map_err(client_error_response)?;

    let key_thumbprint = client
        .decoded_public_key()
        .map(|key| key.thumbprint())
        .map_err(|e| client_error_response(e.into()))?;

    Ok(ResponseJson(ClientView {
        client,
        key_thumbprint,
    }))
}

fn client_error_response(e: ClientError) -> HandlerError {
    let status = match &e {
        ClientError::InvalidRequest(_)
        | ClientError::DuplicateClientId(_)
        | ClientError::InvalidPublicKey(_) => StatusCode::BAD_REQUEST,
        ClientError::InvalidClientId(_) | ClientError::InvalidClient => StatusCode::NOT_FOUND,
        ClientError::Storage(_) | ClientError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let description = if status.is_server_error() {
        tracing::error!(error = ?e, "client management request failed");
        "Internal server error".to_string()
    } else {
        e.to_string()
    };

    (
        status,
        ResponseJson(json!({
            "error": e.error_code(),
            "error_description": description
        })),
    )
}
