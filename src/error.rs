use serde_json::Value;
use thiserror::Error;

/// Message used when an error body cannot be parsed at all.
pub const GENERIC_ERROR: &str = "An error occurred";

/// Every failure surfaced by the CineBook client. `Display` is the
/// human-readable message only, so callers can show it to the user as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{0}")]
    Transport(String),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("{0}")]
    Decode(String),
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    pub fn from_error_body(status: u16, body: &[u8]) -> Self {
        ApiError::Status {
            status,
            message: error_message(status, body),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Picks the message to show for a non-success response.
///
/// A string `detail` wins. A validation-error list contributes the first
/// entry's `msg`. A JSON body without either falls back to the status line,
/// and an unparsable body to [`GENERIC_ERROR`].
pub fn error_message(status: u16, body: &[u8]) -> String {
    let parsed: Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(_) => return GENERIC_ERROR.to_string(),
    };
    let detail = match parsed.get("detail") {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Array(items)) => items
            .first()
            .and_then(|item| item.get("msg"))
            .and_then(|m| m.as_str())
            .map(|s| s.to_string()),
        _ => None,
    };
    detail.unwrap_or_else(|| format!("HTTP error! status: {}", status))
}

/// Extracts the user-facing message from an error returned by the client.
pub fn user_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ApiError>() {
        Some(api) => api.to_string(),
        None => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_string_detail() {
        let msg = error_message(403, br#"{"detail":"Not authorized"}"#);
        assert_eq!(msg, "Not authorized");
    }

    #[test]
    fn uses_first_validation_message() {
        let body = br#"{"detail":[{"loc":["body","email"],"msg":"value is not a valid email address"},{"msg":"second"}]}"#;
        assert_eq!(error_message(422, body), "value is not a valid email address");
    }

    #[test]
    fn synthesizes_status_message_when_detail_missing() {
        assert_eq!(error_message(500, br#"{"error":"boom"}"#), "HTTP error! status: 500");
        assert_eq!(error_message(404, br#"{"detail":""}"#), "HTTP error! status: 404");
        assert_eq!(error_message(400, br#"{"detail":null}"#), "HTTP error! status: 400");
    }

    #[test]
    fn never_surfaces_raw_body() {
        let msg = error_message(502, b"<html>Bad Gateway</html>");
        assert_eq!(msg, GENERIC_ERROR);
        assert_eq!(error_message(500, b""), GENERIC_ERROR);
    }

    #[test]
    fn display_is_the_bare_message() {
        let err = ApiError::from_error_body(403, br#"{"detail":"Not authorized"}"#);
        assert_eq!(err.to_string(), "Not authorized");
        assert_eq!(err.status(), Some(403));
        let wrapped: anyhow::Error = err.into();
        assert_eq!(user_message(&wrapped), "Not authorized");
        assert_eq!(format!("Error: {}", wrapped), "Error: Not authorized");
    }
}
