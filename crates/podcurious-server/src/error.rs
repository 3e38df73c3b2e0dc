use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use podcurious_core::Error;

/// A failed API request, rendered as `{"error": message}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Client errors pass through as-is; anything else is a 500 whose message starts with
    /// the route's `context`.
    pub fn from_core(context: &str, e: Error) -> Self {
        if e.is_client_error() {
            return Self::bad_request(e.to_string());
        }
        tracing::error!(error = %e, "{context}");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{context}: {e}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_and_input_are_client_errors() {
        let e = ApiError::from_core("Failed to analyze", Error::Extraction("nope".into()));
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        assert_eq!(e.message, "nope");
        let e = ApiError::from_core("Chat failed", Error::Input("No messages".into()));
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn upstream_failures_are_prefixed_500s() {
        let e = ApiError::from_core("Chat failed", Error::Llm("overloaded".into()));
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.message, "Chat failed: overloaded");
    }
}
