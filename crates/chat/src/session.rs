//! Runs a [`ChatState`] on a tokio task.
//!
//! Inputs are processed one at a time in arrival order. Network calls run as
//! their own tasks; a send's outcome comes back through the same queue as a
//! [`Event::SendResolved`], so it is ordered against everything else.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::controller::{ChatState, Command, Event, Presence};
use crate::message::{ChatRef, Message, OutgoingMessage, User};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Backend operations a chat session needs.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn mark_seen(&self, chat: &ChatRef) -> Result<(), TransportError>;

    async fn create_message(
        &self,
        chat: &ChatRef,
        message: &OutgoingMessage,
    ) -> Result<(), TransportError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("chat session closed")]
pub struct SessionClosed;

enum Input {
    Event(Event),
    /// Send whatever is in the compose buffer.
    Send,
    Snapshot(oneshot::Sender<ChatState>),
    Close,
}

pub struct ChatSession {
    state: ChatState,
    transport: Arc<dyn ChatTransport>,
    pending: Vec<Command>,
}

impl ChatSession {
    /// Open a chat. Opening counts as seeing it.
    pub fn open(
        chat: ChatRef,
        participants: Vec<User>,
        initial: Vec<Message>,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self::with_state(ChatState::new(chat, participants, initial), transport)
    }

    pub fn with_state(state: ChatState, transport: Arc<dyn ChatTransport>) -> Self {
        let pending = vec![Command::MarkSeen(state.chat().clone())];
        Self {
            state,
            transport,
            pending,
        }
    }

    pub fn state(&self) -> &ChatState {
        &self.state
    }

    /// Start processing on a background task.
    ///
    /// Returns the handle used to drive the session and the stream of alerts
    /// meant for the user.
    pub fn spawn(self) -> (ChatHandle, mpsc::UnboundedReceiver<String>) {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (alert_tx, alert_rx) = mpsc::unbounded_channel();

        let feedback = input_tx.downgrade();
        tokio::spawn(self.run(input_rx, feedback, alert_tx));

        (ChatHandle { inputs: input_tx }, alert_rx)
    }

    async fn run(
        mut self,
        mut inputs: mpsc::UnboundedReceiver<Input>,
        feedback: mpsc::WeakUnboundedSender<Input>,
        alerts: mpsc::UnboundedSender<String>,
    ) {
        let pending = std::mem::take(&mut self.pending);
        self.execute(pending, &feedback, &alerts);

        while let Some(input) = inputs.recv().await {
            let event = match input {
                Input::Event(event) => event,
                Input::Send => Event::send(self.state.compose()),
                Input::Snapshot(reply) => {
                    let _ = reply.send(self.state.clone());
                    continue;
                }
                Input::Close => break,
            };

            let commands = self.state.apply(event);
            self.execute(commands, &feedback, &alerts);
        }

        debug!(chat_id = %self.state.chat().chat_id, "chat session closed");
    }

    fn execute(
        &self,
        commands: Vec<Command>,
        feedback: &mpsc::WeakUnboundedSender<Input>,
        alerts: &mpsc::UnboundedSender<String>,
    ) {
        for command in commands {
            match command {
                Command::MarkSeen(chat) => {
                    let transport = Arc::clone(&self.transport);
                    tokio::spawn(async move {
                        if let Err(error) = transport.mark_seen(&chat).await {
                            warn!(chat_id = %chat.chat_id, %error, "error setting seen");
                        }
                    });
                }
                Command::CreateMessage { chat, message } => {
                    let transport = Arc::clone(&self.transport);
                    let feedback = feedback.clone();
                    tokio::spawn(async move {
                        let result = transport
                            .create_message(&chat, &message)
                            .await
                            .map_err(|error| error.to_string());
                        let resolved = Event::SendResolved {
                            id: message.id,
                            result,
                        };
                        // The session may already be gone.
                        if let Some(inputs) = feedback.upgrade() {
                            let _ = inputs.send(Input::Event(resolved));
                        }
                    });
                }
                Command::Alert(text) => {
                    warn!(chat_id = %self.state.chat().chat_id, alert = %text, "chat alert");
                    let _ = alerts.send(text);
                }
            }
        }
    }
}

/// Cheap, cloneable handle on a running [`ChatSession`].
#[derive(Clone)]
pub struct ChatHandle {
    inputs: mpsc::UnboundedSender<Input>,
}

impl ChatHandle {
    fn push(&self, input: Input) -> Result<(), SessionClosed> {
        self.inputs.send(input).map_err(|_| SessionClosed)
    }

    pub fn deliver(&self, batch: Vec<Message>) -> Result<(), SessionClosed> {
        self.push(Input::Event(Event::BatchArrived(batch)))
    }

    pub fn compose(&self, text: impl Into<String>) -> Result<(), SessionClosed> {
        self.push(Input::Event(Event::ComposeChanged(text.into())))
    }

    /// Send the current compose buffer. Does nothing if it is empty.
    pub fn send(&self) -> Result<(), SessionClosed> {
        self.push(Input::Send)
    }

    pub fn toggle(&self, presence: Presence) -> Result<(), SessionClosed> {
        self.push(Input::Event(Event::TogglePresence(presence)))
    }

    pub fn switch_chat(&self, chat: ChatRef) -> Result<(), SessionClosed> {
        self.push(Input::Event(Event::ChatChanged(chat)))
    }

    pub fn online_users(&self, ids: Vec<String>) -> Result<(), SessionClosed> {
        self.push(Input::Event(Event::OnlineUsersChanged(ids)))
    }

    /// The state after every input queued so far has been applied.
    pub async fn snapshot(&self) -> Result<ChatState, SessionClosed> {
        let (reply, response) = oneshot::channel();
        self.push(Input::Snapshot(reply))?;
        response.await.map_err(|_| SessionClosed)
    }

    pub fn close(&self) -> Result<(), SessionClosed> {
        self.push(Input::Close)
    }
}
