use async_trait::async_trait;
use reqwest::header::{HeaderValue, COOKIE};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::message::{ChatRef, OutgoingMessage};
use crate::session::{ChatTransport, TransportError};

const TOKEN_COOKIE: &str = "token";

#[derive(Debug, Error)]
pub enum ClientError {
    /// The gateway answered with a non-success status.
    #[error("{error}")]
    Status { status: StatusCode, error: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("not logged in")]
    NotLoggedIn,
}

impl From<ClientError> for TransportError {
    fn from(error: ClientError) -> Self {
        TransportError(error.to_string())
    }
}

/// The signed-in account as the gateway reports it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: Account,
}

#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
struct ProfileEnvelope {
    user: Account,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the gateway. Carries the session token as the `token`
/// cookie once logged in.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = Client::builder().build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Resume an existing session.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    async fn request<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<R, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "calling gateway");

        let mut request = self.http.request(method, url);
        if let Some(token) = &self.token {
            let cookie = format!("{TOKEN_COOKIE}={}", urlencoding::encode(token));
            if let Ok(value) = HeaderValue::from_str(&cookie) {
                request = request.header(COOKIE, value);
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let body: ErrorBody = serde_json::from_slice(&bytes).unwrap_or_default();
            let error = body.error.unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            return Err(ClientError::Status { status, error });
        }

        let payload: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        serde_json::from_slice(payload).map_err(|error| ClientError::Status {
            status,
            error: format!("invalid response: {error}"),
        })
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<Session, ClientError> {
        let body = json!({ "email": email, "password": password });
        let session: Session = self.request(Method::POST, "/api/login", Some(&body)).await?;
        self.token = Some(session.token.clone());
        Ok(session)
    }

    pub async fn signup(&mut self, request: &SignupRequest) -> Result<Session, ClientError> {
        let body = json!({
            "first_name": request.first_name,
            "last_name": request.last_name,
            "email": request.email,
            "password": request.password,
        });
        let session: Session = self.request(Method::POST, "/api/signup", Some(&body)).await?;
        self.token = Some(session.token.clone());
        Ok(session)
    }

    pub async fn profile(&self) -> Result<Account, ClientError> {
        if self.token.is_none() {
            return Err(ClientError::NotLoggedIn);
        }
        let envelope: ProfileEnvelope = self.request(Method::GET, "/api/profile", None).await?;
        Ok(envelope.user)
    }

    /// Forget the session locally, telling the gateway when there is one.
    pub async fn logout(&mut self) -> Result<(), ClientError> {
        if self.token.is_none() {
            return Ok(());
        }
        let result = self
            .request::<Value>(Method::POST, "/api/logout", None)
            .await
            .map(|_| ());
        self.token = None;
        result
    }

    pub async fn mark_seen(&self, chat: &ChatRef) -> Result<(), ClientError> {
        let body = json!({ "resource_type": chat.chat_type, "resource_id": chat.chat_id });
        self.request::<Value>(Method::POST, "/api/seen", Some(&body))
            .await
            .map(|_| ())
    }

    pub async fn create_message(
        &self,
        chat: &ChatRef,
        message: &OutgoingMessage,
    ) -> Result<(), ClientError> {
        let body = json!({
            "resource_type": chat.chat_type,
            "resource_id": chat.chat_id,
            "id": message.id,
            "text": message.text,
        });
        self.request::<Value>(Method::POST, "/api/messages", Some(&body))
            .await
            .map(|_| ())
    }

    pub async fn reject_invite(&self, invite_id: &str) -> Result<(), ClientError> {
        let path = format!("/api/invites/{}/reject", urlencoding::encode(invite_id));
        self.request::<Value>(Method::POST, &path, None)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl ChatTransport for GatewayClient {
    async fn mark_seen(&self, chat: &ChatRef) -> Result<(), TransportError> {
        GatewayClient::mark_seen(self, chat).await.map_err(Into::into)
    }

    async fn create_message(
        &self,
        chat: &ChatRef,
        message: &OutgoingMessage,
    ) -> Result<(), TransportError> {
        GatewayClient::create_message(self, chat, message)
            .await
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = GatewayClient::with_client(Client::new(), "http://localhost:3000/");
        assert_eq!(client.base_url, "http://localhost:3000");
        assert!(client.token().is_none());
    }

    #[test]
    fn status_errors_display_the_gateway_message() {
        let error = ClientError::Status {
            status: StatusCode::BAD_REQUEST,
            error: "Your email does not match the invite".into(),
        };
        assert_eq!(error.to_string(), "Your email does not match the invite");
        assert_eq!(
            TransportError::from(error),
            TransportError("Your email does not match the invite".into())
        );
    }
}
