use crate::types::ApiErrorEnvelope;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("could not reach the language model API: {0}")]
    Http(#[from] reqwest::Error),
    #[error("language model API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("language model stream failed: {0}")]
    Stream(String),
    #[error("could not decode language model response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl LlmError {
    /// Build an [`LlmError::Api`] from a non-success response, preferring the
    /// provider's `{"error": {"message": ...}}` body when there is one.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<ApiErrorEnvelope>(body) {
            Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
            _ if body.trim().is_empty() => "no response body".to_string(),
            _ => body.trim().to_string(),
        };
        LlmError::Api { status, message }
    }
}
