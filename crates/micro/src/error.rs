use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for backend calls.
pub type MicroResult<T> = Result<T, MicroError>;

/// A failed backend call: the message and the status code the service chose.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{error} (code {code})")]
pub struct MicroError {
    pub error: String,
    pub code: u16,
}

impl MicroError {
    pub const BAD_GATEWAY: u16 = 502;

    pub fn new(code: u16, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code,
        }
    }

    /// The service could not be reached or answered with something unreadable.
    pub fn transport(error: impl std::fmt::Display) -> Self {
        Self::new(Self::BAD_GATEWAY, error.to_string())
    }
}

impl From<reqwest::Error> for MicroError {
    fn from(error: reqwest::Error) -> Self {
        Self::transport(error)
    }
}
