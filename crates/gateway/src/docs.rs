use axum::Json;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::token::TOKEN_COOKIE;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health_check,
        crate::routes::auth::login,
        crate::routes::auth::signup,
        crate::routes::auth::logout,
        crate::routes::auth::profile,
        crate::routes::seen::seen,
        crate::routes::invites::reject_invite,
        crate::routes::messages::create_message,
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::routes::health::HealthResponse,
            crate::routes::auth::LoginRequest,
            crate::routes::auth::SignupRequest,
            crate::routes::auth::UserResponse,
            crate::routes::auth::SessionResponse,
            crate::routes::auth::ProfileResponse,
            crate::routes::messages::CreateMessageRequest
        )
    ),
    tags(
        (name = "Health", description = "Service health endpoints"),
        (name = "Auth", description = "Login, signup and session management"),
        (name = "Seen", description = "Read receipts"),
        (name = "Invites", description = "Chat and thread invitations"),
        (name = "Messages", description = "Posting messages")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.security_schemes.insert(
            "tokenCookie".to_string(),
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(TOKEN_COOKIE))),
        );
    }
}

/// Serve the generated OpenAPI document.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
