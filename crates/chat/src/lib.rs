//! # Distributed Chat Crate
//!
//! Client-side state for an open chat or thread.
//!
//! - **Controller**: a pure reducer over [`ChatState`]. Events go in, the new
//!   state and a list of [`Command`]s come out. Nothing here touches the
//!   network.
//! - **Session**: runs one reducer per open chat on a tokio task, executes its
//!   commands through a [`ChatTransport`] and feeds send results back in.
//! - **Client**: [`GatewayClient`], the HTTP client for the gateway, which is
//!   also the production [`ChatTransport`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use distributed_chat::{ChatRef, ChatSession, GatewayClient};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = GatewayClient::new("http://127.0.0.1:3000")?;
//! client.login("alice@example.com", "secret").await?;
//!
//! let chat = ChatRef::new("chat", "c1");
//! let (handle, mut alerts) = ChatSession::open(chat, Vec::new(), Vec::new(), Arc::new(client)).spawn();
//! handle.compose("hello")?;
//! handle.send()?;
//! # let _ = alerts.recv().await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod controller;
pub mod message;
pub mod session;

pub use client::{Account, ClientError, GatewayClient, Session, SignupRequest};
pub use controller::{reduce, ChatState, Command, Event, Presence};
pub use message::{ChatRef, Message, OutgoingMessage, User};
pub use session::{ChatHandle, ChatSession, ChatTransport, SessionClosed, TransportError};
