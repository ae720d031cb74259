use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method},
    response::Response,
    Json,
};
use serde_json::{json, Map, Value};
use tracing::error;

use crate::{
    pipeline::{Endpoint, MethodPolicy},
    routes::parse_json,
    ApiError, AppState,
};

const SEEN_METHODS: &[Method] = &[Method::GET, Method::POST];
const SEEN: Endpoint = Endpoint::new("seen", MethodPolicy::Ignore(SEEN_METHODS));

/// An empty body is an empty record; anything else must be a JSON object.
fn parse_fields(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    parse_json(body)
}

#[utoipa::path(
    post,
    path = "/api/seen",
    tag = "Seen",
    responses(
        (status = 200, description = "Last seen time updated (other methods are ignored)"),
        (status = 400, description = "Body is not a JSON object", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse),
        (status = 500, description = "The seen service failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn seen(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    SEEN.run(&state, &method, &headers, |state, identity| async move {
        let fields = parse_fields(&body)?;

        state
            .seen()
            .set(identity.id(), fields)
            .await
            .map_err(|err| {
                error!(error = %err.error, code = err.code, "error updating last seen");
                ApiError::internal_server_error("Error updating last seen time")
            })?;

        Ok::<_, ApiError>(Json(json!({})))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_is_an_empty_record() {
        assert!(parse_fields(b"").unwrap().is_empty());
        assert!(parse_fields(b"  \n").unwrap().is_empty());
    }

    #[test]
    fn non_object_bodies_are_rejected() {
        assert!(parse_fields(b"[1, 2]").is_err());
        assert!(parse_fields(b"{nope").is_err());
    }

    #[test]
    fn object_bodies_are_kept_as_is() {
        let fields = parse_fields(br#"{"resource_type":"thread","resource_id":"t1"}"#).unwrap();
        assert_eq!(fields["resource_type"], "thread");
        assert_eq!(fields["resource_id"], "t1");
    }
}
