use axum::{
    body::Bytes,
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, Method},
    response::{IntoResponse, Response},
    Json,
};
use distributed_micro::{CreateUserRequest, Session, User};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::{
    pipeline::{Endpoint, MethodPolicy},
    routes::parse_json,
    token, ApiError, AppState,
};

const PROFILE: Endpoint = Endpoint::new("profile", MethodPolicy::Any);

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(value: User) -> Self {
        Self {
            id: value.id,
            first_name: value.first_name,
            last_name: value.last_name,
            email: value.email,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserResponse,
}

impl From<Session> for SessionResponse {
    fn from(value: Session) -> Self {
        Self {
            token: value.token,
            user: value.user.into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user: UserResponse,
}

/// Hand a freshly issued session to the client, token cookie included.
fn session_response(session: Session) -> Response {
    let cookie = token::session_cookie(&session.token);
    (
        [(SET_COOKIE, cookie)],
        Json(SessionResponse::from(session)),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/api/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; the token cookie is set", body = SessionResponse),
        (status = 400, description = "Malformed request body", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let params: LoginRequest = parse_json(&body)?;

    let session = state.users().login(&params.email, &params.password).await?;
    info!(user_id = %session.user.id, "user logged in");

    Ok(session_response(session))
}

#[utoipa::path(
    post,
    path = "/api/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Account created; the token cookie is set", body = SessionResponse),
        (status = 400, description = "Malformed request body or rejected fields", body = crate::error::ErrorResponse)
    )
)]
pub async fn signup(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let params: SignupRequest = parse_json(&body)?;

    let request = CreateUserRequest {
        first_name: params.first_name,
        last_name: params.last_name,
        email: params.email,
        password: params.password,
    };
    let session = state.users().create(&request).await?;
    info!(user_id = %session.user.id, "user signed up");

    Ok(session_response(session))
}

/// Logging out always succeeds from the client's point of view: once a token
/// cookie was presented it is cleared, whatever the user service says.
#[utoipa::path(
    post,
    path = "/api/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Logged out; the token cookie is cleared"),
        (status = 500, description = "The user service failed to deactivate the token", body = crate::error::ErrorResponse)
    )
)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(token) = token::from_headers(&headers) else {
        return Json(json!({})).into_response();
    };

    let clear = [(SET_COOKIE, token::clear_cookie())];

    let identity = match state.authenticate(&token).await {
        Ok(identity) => identity,
        Err(error) => {
            debug!(error = %error.message, "logout with a token that no longer validates");
            return (clear, Json(json!({}))).into_response();
        }
    };

    match state.users().logout(identity.id()).await {
        Ok(()) => {
            info!(user_id = %identity.id(), "user logged out");
            (clear, Json(json!({}))).into_response()
        }
        Err(error) => {
            warn!(user_id = %identity.id(), "backend logout failed, cookie cleared anyway");
            (clear, ApiError::from(error)).into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/profile",
    tag = "Auth",
    responses(
        (status = 200, description = "The authenticated user", body = ProfileResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ErrorResponse)
    )
)]
pub async fn profile(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    PROFILE
        .run(&state, &method, &headers, |_state, identity| async move {
            Ok::<_, ApiError>(Json(ProfileResponse {
                user: identity.into_user().into(),
            }))
        })
        .await
}
