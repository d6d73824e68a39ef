use thiserror::Error;

/// Common errors that can occur while talking to a vendor HTTP endpoint
#[derive(Error, Debug)]
pub enum CommonRequestError {
    /// HTTP request failed before a status was received, or the body read failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The vendor answered with a non-2xx status
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Best-effort human readable message extracted from the body
        message: String,
        /// Raw response body
        body: bytes::Bytes,
    },

    /// Invalid event data in streaming response
    #[error("Invalid event data: {0}")]
    InvalidEventData(String),
}

impl CommonRequestError {
    /// Returns the HTTP status code for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            CommonRequestError::Api { status, .. } => Some(*status),
            CommonRequestError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Parse error response from HTTP status and body
pub fn parse_error_response(status: reqwest::StatusCode, body: bytes::Bytes) -> CommonRequestError {
    let message = serde_json::from_slice::<serde_json::Value>(&body)
        .ok()
        .and_then(|json| extract_error_message(&json))
        .unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned());

    CommonRequestError::Api {
        status: status.as_u16(),
        message,
        body,
    }
}

/// Extract error message from the vendor JSON error formats.
///
/// OpenAI, Groq, Mistral, Anthropic and Gemini all nest it as
/// `{"error": {"message": "..."}}`; some gateways use a top-level `message`.
fn extract_error_message(json: &serde_json::Value) -> Option<String> {
    json.pointer("/error/message")
        .or_else(|| json.get("message"))
        .or_else(|| json.get("error").filter(|e| e.is_string()))
        .and_then(|m| m.as_str())
        .map(str::to_string)
}
