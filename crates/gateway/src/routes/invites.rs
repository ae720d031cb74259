use axum::{
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode},
    response::Response,
    Json,
};
use distributed_micro::Invite;
use serde_json::json;
use tracing::{error, info};

use crate::{
    error::ErrorKind,
    pipeline::{Endpoint, MethodPolicy},
    state::AuthorizedIdentity,
    ApiError, AppState,
};

const REJECT_METHODS: &[Method] = &[Method::POST];
const REJECT_INVITE: Endpoint = Endpoint::new("reject_invite", MethodPolicy::Reject(REJECT_METHODS));

/// Only the invited address may act on an invite.
fn ensure_invitee(identity: &AuthorizedIdentity, invite: &Invite) -> Result<(), ApiError> {
    if invite.email != identity.email() {
        return Err(ApiError::new(
            ErrorKind::Forbidden,
            StatusCode::BAD_REQUEST,
            "Your email does not match the invite",
        ));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/invites/{invite_id}/reject",
    tag = "Invites",
    params(
        ("invite_id" = String, Path, description = "Invite identifier")
    ),
    responses(
        (status = 200, description = "Invite rejected"),
        (status = 400, description = "The invite was sent to another email", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse),
        (status = 405, description = "Only POST is accepted"),
        (status = 500, description = "The invite could not be deleted", body = crate::error::ErrorResponse)
    )
)]
pub async fn reject_invite(
    State(state): State<AppState>,
    Path(invite_id): Path<String>,
    method: Method,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    REJECT_INVITE
        .run_authorized(
            &state,
            &method,
            &headers,
            |state, _identity| async move {
                state.invites().read(&invite_id).await.map_err(ApiError::from)
            },
            ensure_invitee,
            |state, identity, invite| async move {
                state.invites().delete(&invite.id).await.map_err(|err| {
                    error!(invite_id = %invite.id, error = %err.error, code = err.code, "error deleting invite");
                    ApiError::internal_server_error("Error rejecting invitation")
                })?;

                info!(invite_id = %invite.id, user_id = %identity.id(), "invite rejected");
                Ok::<_, ApiError>(Json(json!({})))
            },
        )
        .await
}
