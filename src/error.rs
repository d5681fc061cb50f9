use thiserror::Error;

#[derive(Debug, Error)]
pub enum NutritionError {
    #[error("FDC API key not configured (expected in {0})")]
    MissingApiKey(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("{endpoint} failed: {status} {error_body}")]
    ApiError {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        error_body: String,
    },

    #[error("Malformed {endpoint} response: {source}")]
    DecodeError {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage error: {0}")]
    StorageError(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl NutritionError {
    /// True for failures caused by the FDC service rather than local state.
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            NutritionError::NetworkError(_)
                | NutritionError::ApiError { .. }
                | NutritionError::DecodeError { .. }
        )
    }
}
