//! Token endpoints and bearer token enforcement.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tokio::sync::RwLock;

use super::magento_error;
use crate::mock_server::state::MockState;

/// Token issued for valid credentials.
pub const ISSUED_TOKEN: &str = "mock-session-token";

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

/// POST /integration/{admin,customer}/token
pub async fn issue_token(
    State(state): State<Arc<RwLock<MockState>>>,
    Json(request): Json<TokenRequest>,
) -> Response {
    let state = state.read().await;
    let accepted = match &state.credentials {
        Some((user, pass)) => *user == request.username && *pass == request.password,
        None => false,
    };

    if accepted {
        let token = state.required_token.as_deref().unwrap_or(ISSUED_TOKEN);
        (StatusCode::OK, Json(token.to_string())).into_response()
    } else {
        magento_error(
            StatusCode::UNAUTHORIZED,
            "The account sign-in was incorrect or your account is disabled temporarily.",
        )
    }
}

/// Reject requests without the configured bearer token.
pub async fn require_token(
    State(state): State<Arc<RwLock<MockState>>>,
    request: Request,
    next: Next,
) -> Response {
    let required = state.read().await.required_token.clone();
    if let Some(token) = required {
        let expected = format!("Bearer {token}");
        let presented = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        if presented != Some(expected.as_str()) {
            return magento_error(
                StatusCode::UNAUTHORIZED,
                "The consumer isn't authorized to access %resources.",
            );
        }
    }
    next.run(request).await
}
