//! Integration tests for `GatewayClient` against a mocked gateway.

use distributed_chat::{ChatRef, ChatTransport, ClientError, GatewayClient, OutgoingMessage, SignupRequest};
use httpmock::prelude::*;
use reqwest::StatusCode;
use serde_json::json;

fn client_for(server: &MockServer) -> GatewayClient {
    GatewayClient::with_client(reqwest::Client::new(), &server.base_url())
}

fn session_body(token: &str) -> serde_json::Value {
    json!({
        "token": token,
        "user": {
            "id": "usr_1",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com"
        }
    })
}

#[tokio::test]
async fn login_stores_the_token_for_later_calls() {
    let server = MockServer::start_async().await;
    let login = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/login")
                .json_body(json!({ "email": "ada@example.com", "password": "secret" }));
            then.status(200).json_body(session_body("tok 1"));
        })
        .await;
    let profile = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/profile")
                .header("cookie", "token=tok%201");
            then.status(200).json_body(json!({
                "user": { "id": "usr_1", "email": "ada@example.com" }
            }));
        })
        .await;

    let mut client = client_for(&server);
    let session = client.login("ada@example.com", "secret").await.expect("login");
    let account = client.profile().await.expect("profile");

    login.assert_async().await;
    profile.assert_async().await;
    assert_eq!(session.user.first_name, "Ada");
    assert_eq!(client.token(), Some("tok 1"));
    assert_eq!(account.id, "usr_1");
}

#[tokio::test]
async fn signup_signs_the_new_user_in() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/signup").json_body(json!({
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email": "ada@example.com",
                "password": "secret"
            }));
            then.status(200).json_body(session_body("tok_new"));
        })
        .await;

    let mut client = client_for(&server);
    let request = SignupRequest {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        email: "ada@example.com".into(),
        password: "secret".into(),
    };
    client.signup(&request).await.expect("signup");

    assert_eq!(client.token(), Some("tok_new"));
}

#[tokio::test]
async fn profile_without_a_session_fails_locally() {
    let server = MockServer::start_async().await;
    let error = client_for(&server).profile().await.expect_err("no session");
    assert!(matches!(error, ClientError::NotLoggedIn));
}

#[tokio::test]
async fn gateway_errors_carry_status_and_message() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/invites/inv_1/reject");
            then.status(400)
                .json_body(json!({ "error": "Your email does not match the invite" }));
        })
        .await;

    let error = client_for(&server)
        .with_token("tok")
        .reject_invite("inv_1")
        .await
        .expect_err("rejection should fail");

    match error {
        ClientError::Status { status, error } => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(error, "Your email does not match the invite");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn errors_without_a_body_use_the_status_reason() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/api/seen");
            then.status(503);
        })
        .await;

    let error = client_for(&server)
        .with_token("tok")
        .mark_seen(&ChatRef::new("chat", "c1"))
        .await
        .expect_err("seen should fail");

    assert_eq!(error.to_string(), "Service Unavailable");
}

#[tokio::test]
async fn logout_forgets_the_token() {
    let server = MockServer::start_async().await;
    let logout = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/logout")
                .header("cookie", "token=tok");
            then.status(200)
                .header("set-cookie", "token=; Max-Age=-1; Path=/")
                .json_body(json!({}));
        })
        .await;

    let mut client = client_for(&server).with_token("tok");
    client.logout().await.expect("logout");

    logout.assert_async().await;
    assert!(client.token().is_none());
}

#[tokio::test]
async fn transport_marks_seen_and_creates_messages() {
    let server = MockServer::start_async().await;
    let seen = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/seen")
                .header("cookie", "token=tok")
                .json_body(json!({ "resource_type": "thread", "resource_id": "t1" }));
            then.status(200).json_body(json!({}));
        })
        .await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/messages").json_body(json!({
                "resource_type": "thread",
                "resource_id": "t1",
                "id": "m1",
                "text": "hello"
            }));
            then.status(200).json_body(json!({}));
        })
        .await;

    let client = client_for(&server).with_token("tok");
    let chat = ChatRef::new("thread", "t1");
    let message = OutgoingMessage {
        id: "m1".into(),
        text: "hello".into(),
    };

    ChatTransport::mark_seen(&client, &chat).await.expect("seen");
    ChatTransport::create_message(&client, &chat, &message)
        .await
        .expect("create");

    seen.assert_async().await;
    create.assert_async().await;
}
