//! # Distributed micro client
//!
//! Typed access to the backend microservices the gateway sits in front of.
//! Every operation is a `POST {base_url}/{service}/{Method}` carrying JSON, and
//! every failure is a [`MicroError`] holding the backend's `{error, code}` pair.
//!
//! The gateway depends on the service traits rather than on [`MicroClient`]
//! directly so that handlers can be exercised against in-memory doubles.

mod client;
mod error;
mod services;
mod types;

pub use client::MicroClient;
pub use error::{MicroError, MicroResult};
pub use services::{InviteService, MessageService, SeenService, UserService};
pub use types::{CreateMessageRequest, CreateUserRequest, Invite, NewMessage, Session, User};
