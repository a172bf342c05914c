// This project was developed with assistance from GitHub Copilot
// JWKS and auth endpoint implementation

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{error, warn};

use crate::error::IssueError;
use crate::issuer::{KeySelector, issue};
use crate::key_management::KeyStore;
use crate::types::{AuthQuery, AuthResponse, ErrorResponse, JwksResponse};

/// Application state: the key store shared by all handlers
pub type AppState = Arc<KeyStore>;

/// Errors surfaced by the auth endpoint
#[derive(Debug)]
pub enum ApiError {
    /// The `expired` query value is not a recognised boolean
    InvalidExpiredFlag(String),
    /// The issuer could not produce a token; the service is misconfigured
    Issue(IssueError),
}

impl From<IssueError> for ApiError {
    fn from(err: IssueError) -> Self {
        ApiError::Issue(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::InvalidExpiredFlag(value) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Invalid value for 'expired': {value:?}"),
            ),
            ApiError::Issue(err) => {
                error!(error = %err, "Token issuance failed");
                let detail = match err {
                    IssueError::NoActiveKey => "No active key available",
                    IssueError::KeyNotFound { .. } => "Expired key missing",
                    IssueError::KeyEncoding(_) | IssueError::Signing(_) => "Token signing failed",
                };
                (StatusCode::INTERNAL_SERVER_ERROR, detail.to_string())
            }
        };
        (status, Json(ErrorResponse { detail })).into_response()
    }
}

/// Parse a boolean-like query value (`true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off`)
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// JWKS endpoint handler - serves public keys in JWKS format
/// Only returns keys that have not expired
pub async fn jwks_handler(State(store): State<AppState>) -> Json<JwksResponse> {
    Json(JwksResponse {
        keys: store.active_public_jwks(),
    })
}

/// Auth endpoint handler - issues JWTs
/// `?expired=true` signs an already-expired token with the reserved expired key
pub async fn auth_handler(
    State(store): State<AppState>,
    Query(params): Query<AuthQuery>,
) -> Result<Json<AuthResponse>, ApiError> {
    let expired = match params.expired.as_deref() {
        None => false,
        Some(raw) => parse_flag(raw).ok_or_else(|| {
            warn!(value = %raw, "Rejected malformed expired flag");
            ApiError::InvalidExpiredFlag(raw.to_string())
        })?,
    };

    let selector = KeySelector::from_expired_flag(expired);
    let token = issue(&store, &selector)?;
    Ok(Json(AuthResponse { token }))
}
