use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method},
    response::Response,
    Json,
};
use distributed_micro::NewMessage;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use utoipa::ToSchema;

use crate::{
    pipeline::{Endpoint, MethodPolicy},
    routes::parse_json,
    ApiError, AppState,
};

const CREATE_MESSAGE: Endpoint = Endpoint::new("create_message", MethodPolicy::Any);

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMessageRequest {
    /// `thread` or `chat`.
    pub resource_type: String,
    pub resource_id: String,
    /// Client-generated message id.
    pub id: String,
    pub text: String,
}

#[utoipa::path(
    post,
    path = "/api/messages",
    tag = "Messages",
    request_body = CreateMessageRequest,
    responses(
        (status = 200, description = "Message created"),
        (status = 400, description = "Malformed request body", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_message(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    CREATE_MESSAGE
        .run(&state, &method, &headers, |state, identity| async move {
            let payload: CreateMessageRequest = parse_json(&body)?;
            if payload.id.trim().is_empty() {
                return Err(ApiError::bad_request("message id is required"));
            }
            if payload.text.is_empty() {
                return Err(ApiError::bad_request("message text is required"));
            }

            let request = distributed_micro::CreateMessageRequest {
                author_id: identity.id().to_string(),
                resource_type: payload.resource_type,
                resource_id: payload.resource_id,
                message: NewMessage {
                    id: payload.id,
                    text: payload.text,
                },
            };
            state.messages().create(&request).await?;
            debug!(message_id = %request.message.id, "message created");

            Ok::<_, ApiError>(Json(json!({})))
        })
        .await
}
