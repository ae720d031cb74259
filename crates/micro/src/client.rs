use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

use distributed_config::ServicesConfig;

use crate::services::{InviteService, MessageService, SeenService, UserService};
use crate::{CreateMessageRequest, CreateUserRequest, Invite, MicroError, MicroResult, Session, User};

/// HTTP client for the microservice API.
#[derive(Debug, Clone)]
pub struct MicroClient {
    http: Client,
    base_url: String,
}

/// Error body as sent by the services. Older services use `detail` instead
/// of `error`.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    code: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Debug, Deserialize)]
struct InviteEnvelope {
    invite: Invite,
}

impl MicroClient {
    pub fn new(config: &ServicesConfig) -> MicroResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self::with_client(http, &config.base_url))
    }

    pub fn with_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Invoke `endpoint` (e.g. `users/Validate`) with `body`.
    pub async fn call<B, R>(&self, endpoint: &str, body: &B) -> MicroResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        debug!(%url, "calling backend service");

        let response = self.http.post(url).json(body).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(decode_error(status, &bytes));
        }

        let payload: &[u8] = if bytes.is_empty() { b"{}" } else { &bytes };
        serde_json::from_slice(payload).map_err(|error| {
            MicroError::transport(format!("invalid response from {endpoint}: {error}"))
        })
    }
}

fn decode_error(status: StatusCode, bytes: &[u8]) -> MicroError {
    let body: ErrorBody = serde_json::from_slice(bytes).unwrap_or_default();
    let message = body
        .error
        .or(body.detail)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("backend request failed")
                .to_string()
        });

    MicroError::new(body.code.unwrap_or(status.as_u16()), message)
}

#[async_trait]
impl UserService for MicroClient {
    async fn validate(&self, token: &str) -> MicroResult<User> {
        let envelope: UserEnvelope = self.call("users/Validate", &json!({ "token": token })).await?;
        Ok(envelope.user)
    }

    async fn login(&self, email: &str, password: &str) -> MicroResult<Session> {
        self.call(
            "users/Login",
            &json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn create(&self, request: &CreateUserRequest) -> MicroResult<Session> {
        self.call("users/Create", request).await
    }

    async fn logout(&self, user_id: &str) -> MicroResult<()> {
        let _: IgnoredAny = self.call("users/Logout", &json!({ "id": user_id })).await?;
        Ok(())
    }
}

#[async_trait]
impl InviteService for MicroClient {
    async fn read(&self, id: &str) -> MicroResult<Invite> {
        let envelope: InviteEnvelope = self.call("invites/Read", &json!({ "id": id })).await?;
        Ok(envelope.invite)
    }

    async fn delete(&self, id: &str) -> MicroResult<()> {
        let _: IgnoredAny = self.call("invites/Delete", &json!({ "id": id })).await?;
        Ok(())
    }
}

#[async_trait]
impl SeenService for MicroClient {
    async fn set(&self, user_id: &str, mut fields: Map<String, Value>) -> MicroResult<()> {
        fields.insert("user_id".to_string(), Value::String(user_id.to_string()));
        let _: IgnoredAny = self.call("seen/Set", &fields).await?;
        Ok(())
    }
}

#[async_trait]
impl MessageService for MicroClient {
    async fn create(&self, request: &CreateMessageRequest) -> MicroResult<()> {
        let _: IgnoredAny = self.call("messages/Create", request).await?;
        Ok(())
    }
}
