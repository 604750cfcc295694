//! HTTP request handlers for the mock server.

pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod search;

pub use auth::*;
pub use catalog::*;
pub use checkout::*;

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};

/// Error body in Magento's `{"message": ...}` shape.
pub(crate) fn magento_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "message": message.into() }))).into_response()
}

pub(crate) fn not_found(what: &str, key: impl std::fmt::Display) -> Response {
    magento_error(
        StatusCode::NOT_FOUND,
        format!("The {what} that was requested doesn't exist. Verify the {what} and try again. ({key})"),
    )
}
