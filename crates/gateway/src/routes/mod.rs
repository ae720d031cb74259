pub mod auth;
pub mod health;
pub mod invites;
pub mod messages;
pub mod seen;

use serde::de::DeserializeOwned;

use crate::ApiError;

/// Decode a JSON request body, reporting failures as a client error.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body)
        .map_err(|error| ApiError::bad_request(format!("Error parsing request body: {error}")))
}
