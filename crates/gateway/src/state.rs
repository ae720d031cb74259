//! Shared application state for the gateway

use std::sync::Arc;

use axum::http::HeaderMap;
use distributed_micro::{InviteService, MessageService, MicroClient, SeenService, User, UserService};
use tracing::debug;

use crate::error::ApiError;
use crate::token;

/// The user a request was authenticated as. Lives for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizedIdentity {
    user: User,
}

impl AuthorizedIdentity {
    pub fn new(user: User) -> Self {
        Self { user }
    }

    pub fn id(&self) -> &str {
        &self.user.id
    }

    pub fn email(&self) -> &str {
        &self.user.email
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn into_user(self) -> User {
        self.user
    }
}

/// Handles to the backend services. Holds no per-request state.
#[derive(Clone)]
pub struct AppState {
    users: Arc<dyn UserService>,
    invites: Arc<dyn InviteService>,
    seen: Arc<dyn SeenService>,
    messages: Arc<dyn MessageService>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserService>,
        invites: Arc<dyn InviteService>,
        seen: Arc<dyn SeenService>,
        messages: Arc<dyn MessageService>,
    ) -> Self {
        Self {
            users,
            invites,
            seen,
            messages,
        }
    }

    /// Route every service through one micro client.
    pub fn from_client(client: Arc<MicroClient>) -> Self {
        Self::new(client.clone(), client.clone(), client.clone(), client)
    }

    pub fn users(&self) -> &dyn UserService {
        self.users.as_ref()
    }

    pub fn invites(&self) -> &dyn InviteService {
        self.invites.as_ref()
    }

    pub fn seen(&self) -> &dyn SeenService {
        self.seen.as_ref()
    }

    pub fn messages(&self) -> &dyn MessageService {
        self.messages.as_ref()
    }

    /// Resolve the caller from the token cookie. No backend call is made when
    /// the cookie is missing.
    pub async fn identify(&self, headers: &HeaderMap) -> Result<AuthorizedIdentity, ApiError> {
        let token = token::from_headers(headers).ok_or_else(ApiError::missing_token)?;
        self.authenticate(&token).await
    }

    pub async fn authenticate(&self, token: &str) -> Result<AuthorizedIdentity, ApiError> {
        let user = self
            .users
            .validate(token)
            .await
            .map_err(ApiError::from_validation)?;

        debug!(user_id = %user.id, "request authenticated");
        Ok(AuthorizedIdentity::new(user))
    }
}
