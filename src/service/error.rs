/// Message shown when the service gave no usable error text.
pub const FALLBACK_MESSAGE: &str = "An error occurred during analysis";

/// Error types for the analysis service client.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {status} - {}", message.as_deref().unwrap_or("no error message"))]
    Api { status: u16, message: Option<String> },

    #[error("Malformed analysis result: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),

    #[error("Analysis task failed: {0}")]
    Task(String),
}

impl ServiceError {
    /// The text a user sees in the failed state: the service's own `error` field when it sent
    /// one, otherwise the generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Api {
                message: Some(m), ..
            } if !m.trim().is_empty() => m.clone(),
            _ => FALLBACK_MESSAGE.to_string(),
        }
    }
}
