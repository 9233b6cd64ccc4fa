use serde::{Deserialize, Serialize};

/// Error body returned by the backend for any non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,

    /// Machine-readable code, when the backend sends one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            code: None,
        }
    }

    /// Parse a response body, returning `None` when it is not an error
    /// envelope or the message is blank.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        serde_json::from_slice::<ErrorResponse>(body)
            .ok()
            .filter(|e| !e.message.trim().is_empty())
    }
}
