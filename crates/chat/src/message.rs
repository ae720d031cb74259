use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat participant as the chat view sees them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    /// Marks the signed-in user among the participants. Local only.
    #[serde(default, skip_serializing)]
    pub current_user: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Client-generated UUID; the identity of the message.
    pub id: String,
    pub text: String,
    pub sent_at: DateTime<Utc>,
    #[serde(default)]
    pub author: Option<User>,
}

/// Which chat or thread a session is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatRef {
    /// `"chat"` or `"thread"`.
    pub chat_type: String,
    pub chat_id: String,
}

impl ChatRef {
    pub fn new(chat_type: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            chat_type: chat_type.into(),
            chat_id: chat_id.into(),
        }
    }
}

/// The part of a message that travels to the backend on send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub id: String,
    pub text: String,
}
