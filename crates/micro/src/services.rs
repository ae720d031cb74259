use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{CreateMessageRequest, CreateUserRequest, Invite, MicroResult, Session, User};

#[async_trait]
pub trait UserService: Send + Sync {
    /// Resolve the user owning `token`.
    async fn validate(&self, token: &str) -> MicroResult<User>;

    async fn login(&self, email: &str, password: &str) -> MicroResult<Session>;

    async fn create(&self, request: &CreateUserRequest) -> MicroResult<Session>;

    /// Deactivate the user's tokens.
    async fn logout(&self, user_id: &str) -> MicroResult<()>;
}

#[async_trait]
pub trait InviteService: Send + Sync {
    async fn read(&self, id: &str) -> MicroResult<Invite>;

    async fn delete(&self, id: &str) -> MicroResult<()>;
}

#[async_trait]
pub trait SeenService: Send + Sync {
    /// Record that `user_id` has seen the resource described by `fields`.
    ///
    /// `user_id` replaces any `user_id` key already present in `fields`.
    async fn set(&self, user_id: &str, fields: Map<String, Value>) -> MicroResult<()>;
}

#[async_trait]
pub trait MessageService: Send + Sync {
    async fn create(&self, request: &CreateMessageRequest) -> MicroResult<()>;
}
