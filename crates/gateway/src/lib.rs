//! # Distributed Gateway Crate
//!
//! The HTTP edge in front of the Distributed microservices. Every
//! authenticated endpoint goes through the same pipeline (see [`pipeline`]):
//!
//! 1. **Method check** per endpoint policy (reject with 405, or ignore).
//! 2. **Token** read from the `token` cookie; a missing cookie is a 401 and
//!    never reaches a backend.
//! 3. **Identity** resolved through `users/Validate`; a 400 from the user
//!    service is reported as 401.
//! 4. **Authorization** against the loaded resource (invites must match the
//!    caller's email).
//! 5. **Backend call**, then translation into a JSON response.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use distributed_gateway::{build_router, AppState};
//! use distributed_micro::MicroClient;
//!
//! # async fn run(client: MicroClient) -> anyhow::Result<()> {
//! let app = build_router(AppState::from_client(Arc::new(client)));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod docs;
pub mod error;
pub mod middleware;
pub mod pipeline;
pub mod routes;
pub mod state;
pub mod token;

pub use error::{ApiError, ErrorKind, ErrorResponse};
pub use pipeline::{Endpoint, MethodPolicy};
pub use state::{AppState, AuthorizedIdentity};

use axum::{
    http::{header, Method},
    middleware as axum_middleware,
    routing::{any, get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api-docs/openapi.json", get(docs::openapi_json))
        .route("/api/login", post(routes::auth::login))
        .route("/api/signup", post(routes::auth::signup))
        .route(
            "/api/logout",
            get(routes::auth::logout).post(routes::auth::logout),
        )
        .route("/api/profile", get(routes::auth::profile))
        .route("/api/seen", any(routes::seen::seen))
        .route(
            "/api/invites/:invite_id/reject",
            any(routes::invites::reject_invite),
        )
        .route("/api/messages", post(routes::messages::create_message))
        .with_state(state)
        .layer(cors_layer())
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
}

/// Credentials travel in a cookie, so the caller's origin is echoed back
/// rather than answered with a wildcard.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}
