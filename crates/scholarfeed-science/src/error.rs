use scholarfeed_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScienceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request to {0} timed out")]
    Timeout(String),

    #[error("search API reported an error: {0}")]
    Remote(String),

    #[error("API error from {0}: {1}")]
    ApiError(String, String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("API key not configured (set {0})")]
    MissingApiKey(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] CoreError),

    #[error("run cancelled before this author was processed")]
    Cancelled,
}

impl ScienceError {
    /// The request never produced a usable response.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ScienceError::Http(_) | ScienceError::Timeout(_)
        )
    }

    /// The search API answered, but with an error.
    pub fn is_remote(&self) -> bool {
        matches!(self, ScienceError::Remote(_) | ScienceError::ApiError(_, _))
    }
}

pub type Result<T> = std::result::Result<T, ScienceError>;
