//! The chat reducer.
//!
//! [`ChatState`] only changes through [`ChatState::apply`] (or [`reduce`]),
//! which returns the side effects the caller is expected to run.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::message::{ChatRef, Message, OutgoingMessage, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Listening,
    Audio,
    Video,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Messages delivered from outside, e.g. a page load or a push.
    BatchArrived(Vec<Message>),
    ComposeChanged(String),
    SendRequested {
        id: String,
        text: String,
        sent_at: DateTime<Utc>,
    },
    /// Outcome of the `CreateMessage` command for `id`.
    SendResolved {
        id: String,
        result: Result<(), String>,
    },
    ChatChanged(ChatRef),
    TogglePresence(Presence),
    OnlineUsersChanged(Vec<String>),
}

impl Event {
    /// A send request for `text` under a fresh message id.
    pub fn send(text: impl Into<String>) -> Self {
        Self::SendRequested {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            sent_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Tell the backend the user has seen the chat. Failures are not reported back.
    MarkSeen(ChatRef),
    CreateMessage {
        chat: ChatRef,
        message: OutgoingMessage,
    },
    /// Show the user an error.
    Alert(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatState {
    chat: ChatRef,
    participants: Vec<User>,
    messages: Vec<Message>,
    compose: String,
    listening: bool,
    joined_audio: bool,
    joined_video: bool,
    online_user_ids: BTreeSet<String>,
    calls_enabled: bool,
}

impl ChatState {
    pub fn new(chat: ChatRef, participants: Vec<User>, initial: Vec<Message>) -> Self {
        Self {
            chat,
            participants,
            messages: merge(Vec::new(), initial),
            compose: String::new(),
            listening: true,
            joined_audio: false,
            joined_video: false,
            online_user_ids: BTreeSet::new(),
            calls_enabled: false,
        }
    }

    pub fn with_calls_enabled(mut self, enabled: bool) -> Self {
        self.calls_enabled = enabled;
        self
    }

    pub fn chat(&self) -> &ChatRef {
        &self.chat
    }

    pub fn participants(&self) -> &[User] {
        &self.participants
    }

    /// Messages in arrival order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn compose(&self) -> &str {
        &self.compose
    }

    pub fn listening(&self) -> bool {
        self.listening
    }

    pub fn joined_audio(&self) -> bool {
        self.joined_audio
    }

    pub fn joined_video(&self) -> bool {
        self.joined_video
    }

    pub fn online_user_ids(&self) -> &BTreeSet<String> {
        &self.online_user_ids
    }

    pub fn calls_enabled(&self) -> bool {
        self.calls_enabled
    }

    /// Messages newest first; equal timestamps are ordered by id.
    pub fn display(&self) -> Vec<&Message> {
        let mut sorted: Vec<&Message> = self.messages.iter().collect();
        sorted.sort_by(|a, b| b.sent_at.cmp(&a.sent_at).then_with(|| a.id.cmp(&b.id)));
        sorted
    }

    fn current_user(&self) -> Option<User> {
        self.participants.iter().find(|user| user.current_user).cloned()
    }

    fn mark_seen(&self) -> Command {
        Command::MarkSeen(self.chat.clone())
    }

    pub fn apply(&mut self, event: Event) -> Vec<Command> {
        match event {
            Event::BatchArrived(batch) => {
                let existing = std::mem::take(&mut self.messages);
                self.messages = merge(existing, batch);
                vec![self.mark_seen()]
            }
            Event::ComposeChanged(text) => {
                self.compose = text;
                Vec::new()
            }
            Event::SendRequested { id, text, sent_at } => {
                if text.is_empty() {
                    return Vec::new();
                }

                self.compose.clear();
                self.messages.push(Message {
                    id: id.clone(),
                    text: text.clone(),
                    sent_at,
                    author: self.current_user(),
                });

                vec![
                    Command::CreateMessage {
                        chat: self.chat.clone(),
                        message: OutgoingMessage { id, text },
                    },
                    self.mark_seen(),
                ]
            }
            Event::SendResolved { result: Ok(()), .. } => Vec::new(),
            Event::SendResolved {
                id,
                result: Err(reason),
            } => {
                let before = self.messages.len();
                self.messages.retain(|message| message.id != id);

                let mut commands = vec![Command::Alert(format!("Error sending message: {reason}"))];
                if self.messages.len() != before {
                    commands.push(self.mark_seen());
                }
                commands
            }
            Event::ChatChanged(chat) => {
                if chat == self.chat {
                    return Vec::new();
                }
                self.chat = chat;
                vec![self.mark_seen()]
            }
            Event::TogglePresence(presence) => {
                let flag = match presence {
                    Presence::Listening => &mut self.listening,
                    Presence::Audio => &mut self.joined_audio,
                    Presence::Video => &mut self.joined_video,
                };
                *flag = !*flag;
                Vec::new()
            }
            Event::OnlineUsersChanged(ids) => {
                self.online_user_ids = ids.into_iter().collect();
                Vec::new()
            }
        }
    }
}

/// Functional form of [`ChatState::apply`].
pub fn reduce(mut state: ChatState, event: Event) -> (ChatState, Vec<Command>) {
    let commands = state.apply(event);
    (state, commands)
}

/// `existing ++ batch`, keeping only the last occurrence of every id, where it
/// stands in the concatenation.
fn merge(existing: Vec<Message>, batch: Vec<Message>) -> Vec<Message> {
    let combined: Vec<Message> = existing.into_iter().chain(batch).collect();
    let last_index: HashMap<String, usize> = combined
        .iter()
        .enumerate()
        .map(|(index, message)| (message.id.clone(), index))
        .collect();

    combined
        .into_iter()
        .enumerate()
        .filter(|(index, message)| last_index.get(&message.id) == Some(index))
        .map(|(_, message)| message)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    fn message(id: &str, text: &str, seconds: i64) -> Message {
        Message {
            id: id.into(),
            text: text.into(),
            sent_at: at(seconds),
            author: None,
        }
    }

    fn chat() -> ChatRef {
        ChatRef::new("chat", "c1")
    }

    fn state() -> ChatState {
        let me = User {
            first_name: "Alice".into(),
            current_user: true,
            ..User::default()
        };
        let other = User {
            first_name: "Bob".into(),
            ..User::default()
        };
        ChatState::new(chat(), vec![other, me], Vec::new())
    }

    fn ids(state: &ChatState) -> Vec<&str> {
        state.messages().iter().map(|m| m.id.as_str()).collect()
    }

    fn display_ids(state: &ChatState) -> Vec<&str> {
        state.display().into_iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn new_state_listens_by_default() {
        let state = state();
        assert!(state.listening());
        assert!(!state.joined_audio());
        assert!(!state.joined_video());
        assert!(!state.calls_enabled());
        assert!(state.compose().is_empty());
    }

    #[test]
    fn disjoint_batches_are_unioned_and_displayed_newest_first() {
        let mut state = state();
        state.apply(Event::BatchArrived(vec![message("a", "one", 1), message("b", "two", 3)]));
        let commands = state.apply(Event::BatchArrived(vec![message("c", "three", 2)]));

        assert_eq!(commands, vec![Command::MarkSeen(chat())]);
        assert_eq!(ids(&state), vec!["a", "b", "c"]);
        assert_eq!(display_ids(&state), vec!["b", "c", "a"]);
    }

    #[test]
    fn display_breaks_timestamp_ties_by_id() {
        let state = ChatState::new(
            chat(),
            Vec::new(),
            vec![message("z", "", 5), message("m", "", 5), message("a", "", 1)],
        );
        assert_eq!(display_ids(&state), vec!["m", "z", "a"]);
    }

    #[test]
    fn later_copy_of_a_message_wins_at_its_position() {
        let merged = merge(
            vec![message("a", "draft", 1), message("b", "two", 2)],
            vec![message("a", "final", 3)],
        );
        let ids: Vec<&str> = merged.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(merged[1].text, "final");
    }

    #[test]
    fn duplicates_inside_one_batch_collapse() {
        let merged = merge(Vec::new(), vec![message("a", "1", 1), message("a", "2", 2)]);
        assert_eq!(merged, vec![message("a", "2", 2)]);
    }

    #[test]
    fn reingesting_the_same_batch_is_a_no_op() {
        let batch = vec![message("a", "one", 1), message("b", "two", 2)];
        let mut state = state();
        state.apply(Event::BatchArrived(batch.clone()));
        let before = state.messages().to_vec();

        let commands = state.apply(Event::BatchArrived(batch));
        assert_eq!(state.messages(), before.as_slice());
        assert_eq!(commands, vec![Command::MarkSeen(chat())]);
    }

    #[test]
    fn send_clears_compose_and_adds_one_message() {
        let mut state = state();
        state.apply(Event::ComposeChanged("hello".into()));
        state.apply(Event::BatchArrived(vec![message("x", "old", 1)]));

        let commands = state.apply(Event::SendRequested {
            id: "a".into(),
            text: "hello".into(),
            sent_at: at(10),
        });

        assert_eq!(state.compose(), "");
        assert_eq!(ids(&state), vec!["x", "a"]);
        let sent = &state.messages()[1];
        assert_eq!(sent.author.as_ref().map(|u| u.first_name.as_str()), Some("Alice"));
        assert_eq!(
            commands,
            vec![
                Command::CreateMessage {
                    chat: chat(),
                    message: OutgoingMessage {
                        id: "a".into(),
                        text: "hello".into(),
                    },
                },
                Command::MarkSeen(chat()),
            ]
        );
    }

    #[test]
    fn send_without_a_current_user_has_no_author() {
        let mut state = ChatState::new(chat(), Vec::new(), Vec::new());
        state.apply(Event::send("hi"));
        assert_eq!(state.messages().len(), 1);
        assert!(state.messages()[0].author.is_none());
    }

    #[test]
    fn empty_send_is_ignored() {
        let mut state = state();
        state.apply(Event::ComposeChanged(String::new()));
        let before = state.clone();

        let commands = state.apply(Event::send(""));
        assert!(commands.is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn generated_sends_get_distinct_ids() {
        let mut state = state();
        state.apply(Event::send("one"));
        state.apply(Event::send("two"));
        assert_eq!(state.messages().len(), 2);
        assert_ne!(state.messages()[0].id, state.messages()[1].id);
    }

    #[test]
    fn optimistic_message_coalesces_with_the_delivered_copy() {
        let mut state = state();
        state.apply(Event::SendRequested {
            id: "a".into(),
            text: "hello".into(),
            sent_at: at(10),
        });
        state.apply(Event::BatchArrived(vec![message("a", "hello", 11)]));

        assert_eq!(ids(&state), vec!["a"]);
        assert_eq!(state.messages()[0].sent_at, at(11));
    }

    #[test]
    fn failed_send_removes_only_that_message() {
        let mut state = state();
        state.apply(Event::BatchArrived(vec![message("x", "old", 1)]));
        state.apply(Event::SendRequested {
            id: "a".into(),
            text: "hello".into(),
            sent_at: at(10),
        });
        state.apply(Event::SendRequested {
            id: "b".into(),
            text: "again".into(),
            sent_at: at(11),
        });

        let commands = state.apply(Event::SendResolved {
            id: "a".into(),
            result: Err("boom".into()),
        });

        assert_eq!(ids(&state), vec!["x", "b"]);
        assert_eq!(
            commands,
            vec![
                Command::Alert("Error sending message: boom".into()),
                Command::MarkSeen(chat()),
            ]
        );
    }

    #[test]
    fn failure_for_an_unknown_message_only_alerts() {
        let mut state = state();
        let commands = state.apply(Event::SendResolved {
            id: "ghost".into(),
            result: Err("boom".into()),
        });
        assert_eq!(commands, vec![Command::Alert("Error sending message: boom".into())]);
    }

    #[test]
    fn successful_send_changes_nothing() {
        let mut state = state();
        state.apply(Event::send("hello"));
        let before = state.clone();
        let id = before.messages()[0].id.clone();

        let commands = state.apply(Event::SendResolved { id, result: Ok(()) });
        assert!(commands.is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn failure_after_confirmation_still_rolls_back_by_id() {
        let mut state = state();
        state.apply(Event::SendRequested {
            id: "a".into(),
            text: "hello".into(),
            sent_at: at(10),
        });
        state.apply(Event::BatchArrived(vec![message("a", "hello", 11)]));
        state.apply(Event::SendResolved {
            id: "a".into(),
            result: Err("timeout".into()),
        });
        assert!(state.messages().is_empty());
    }

    #[test]
    fn chat_change_marks_seen_only_when_the_chat_differs() {
        let mut state = state();
        assert!(state.apply(Event::ChatChanged(chat())).is_empty());

        let thread = ChatRef::new("thread", "t1");
        let commands = state.apply(Event::ChatChanged(thread.clone()));
        assert_eq!(commands, vec![Command::MarkSeen(thread.clone())]);
        assert_eq!(state.chat(), &thread);
    }

    #[test]
    fn presence_toggles_flip_their_flag() {
        let mut state = state();
        assert!(state.apply(Event::TogglePresence(Presence::Listening)).is_empty());
        state.apply(Event::TogglePresence(Presence::Audio));
        state.apply(Event::TogglePresence(Presence::Video));
        state.apply(Event::TogglePresence(Presence::Video));

        assert!(!state.listening());
        assert!(state.joined_audio());
        assert!(!state.joined_video());
    }

    #[test]
    fn online_users_are_replaced() {
        let mut state = state();
        state.apply(Event::OnlineUsersChanged(vec!["u1".into(), "u2".into()]));
        let commands = state.apply(Event::OnlineUsersChanged(vec!["u3".into(), "u3".into()]));

        assert!(commands.is_empty());
        assert_eq!(
            state.online_user_ids().iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["u3"]
        );
    }

    #[test]
    fn reduce_matches_apply() {
        let (state, commands) = reduce(state(), Event::BatchArrived(vec![message("a", "", 1)]));
        assert_eq!(ids(&state), vec!["a"]);
        assert_eq!(commands.len(), 1);
    }
}
