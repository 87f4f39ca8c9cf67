use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("The time-series service is unreachable: {0}")]
    Unreachable(String),

    #[error("Authentication with the time-series service failed: {0}")]
    Authentication(String),

    #[error("The query timed out: {0}")]
    Timeout(String),

    #[error("The HTTP request failed: {0}")]
    Http(String),

    #[error("The API request returned an error: {0}")]
    Provider(String),

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("The query returned no values")]
    EmptyResult,
}

impl ApiError {
    /// Systemic errors mean no query can succeed; they abort a whole snapshot
    /// instead of degrading a single metric.
    pub fn is_systemic(&self) -> bool {
        matches!(self, ApiError::Unreachable(_) | ApiError::Authentication(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            ApiError::Unreachable(e.to_string())
        } else if e.is_timeout() {
            ApiError::Timeout(e.to_string())
        } else if e.is_decode() {
            ApiError::Deserialization(e.to_string())
        } else {
            ApiError::Http(e.to_string())
        }
    }
}
