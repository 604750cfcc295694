//! Response normalization.
//!
//! Turns a completed HTTP exchange into success or a typed
//! [`MagentoError`], and cleans up the raw (non-JSON) bodies some Magento
//! endpoints return.

use reqwest::StatusCode;

use crate::error::{MagentoError, Result};

/// Classify a completed response.
///
/// Statuses below 400 succeed. 404 maps to the bare
/// [`MagentoError::NotFound`] sentinel; every other error status becomes
/// [`MagentoError::BadRequest`] carrying the status and raw body.
pub fn normalize(status: StatusCode, body: &str, operation: &str) -> Result<()> {
    let code = status.as_u16();

    if code < 400 {
        tracing::debug!(status = code, operation, "request succeeded");
        return Ok(());
    }

    if status == StatusCode::NOT_FOUND {
        tracing::warn!(status = code, operation, body, "not found");
        return Err(MagentoError::NotFound);
    }

    tracing::error!(status = code, operation, body, "bad request");
    Err(MagentoError::BadRequest {
        operation: operation.to_string(),
        status: code,
        body: body.to_string(),
    })
}

/// Remove one pair of surrounding double quotes.
///
/// Quote ids, order ids and tokens come back as bare JSON strings.
/// Bodies shorter than two characters are returned unchanged.
pub fn unquote(raw: &str) -> &str {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}

/// Normalize the body returned when adding an attribute option.
///
/// Magento answers with `"id_123"`; callers want `123`.
pub fn strip_option_prefix(raw: &str) -> &str {
    let value = unquote(raw.trim());
    value.strip_prefix("id_").unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_statuses_pass() {
        assert!(normalize(StatusCode::OK, "{}", "get product").is_ok());
        assert!(normalize(StatusCode::NO_CONTENT, "", "delete item").is_ok());
        assert!(normalize(StatusCode::FOUND, "", "redirect").is_ok());
    }

    #[test]
    fn test_404_is_bare_not_found() {
        let err = normalize(StatusCode::NOT_FOUND, "{\"message\":\"x\"}", "get product").unwrap_err();
        assert!(matches!(err, MagentoError::NotFound));
    }

    #[test]
    fn test_other_errors_carry_status_and_body() {
        for status in [
            StatusCode::BAD_REQUEST,
            StatusCode::UNAUTHORIZED,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::SERVICE_UNAVAILABLE,
        ] {
            let err = normalize(status, "boom", "create category").unwrap_err();
            match err {
                MagentoError::BadRequest {
                    operation,
                    status: code,
                    body,
                } => {
                    assert_eq!(operation, "create category");
                    assert_eq!(code, status.as_u16());
                    assert_eq!(body, "boom");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"abc123\""), "abc123");
        assert_eq!(unquote("abc123"), "abc123");
        assert_eq!(unquote("\""), "\"");
        assert_eq!(unquote(""), "");
        assert_eq!(unquote("\"\""), "");
        assert_eq!(unquote("\"abc"), "\"abc");
    }

    #[test]
    fn test_strip_option_prefix() {
        assert_eq!(strip_option_prefix("\"id_42\""), "42");
        assert_eq!(strip_option_prefix("\"42\""), "42");
        assert_eq!(strip_option_prefix("id_7"), "7");
        assert_eq!(strip_option_prefix("\"id_42\"\n"), "42");
    }
}
