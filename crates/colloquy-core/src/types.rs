// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the stores, the dialogue engine and the request layer.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Separator placed between the two participant ids of a chat id.
pub const CHAT_ID_SEPARATOR: char = '_';

/// Identifier of a chat participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Order-independent identifier of the conversation between two users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub String);

impl ChatId {
    /// Derives the chat id for a pair of participants.
    ///
    /// The lexicographically smaller id comes first, so `(a, b)` and `(b, a)`
    /// map to the same chat.
    pub fn for_participants(first: &UserId, second: &UserId) -> Self {
        let (low, high) = if first.0 > second.0 {
            (second, first)
        } else {
            (first, second)
        };
        ChatId(format!("{}{CHAT_ID_SEPARATOR}{}", low.0, high.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store-assigned message identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller-assigned id that deduplicates one logical command across redeliveries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(pub String);

impl CorrelationId {
    /// Generates a fresh random (UUID v4) correlation id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle state of a message.
///
/// `Pending` is the only non-terminal state. It moves to `Sent` on commit or
/// `Removed` on rollback, and never changes again.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageState {
    Pending,
    Sent,
    Removed,
}

impl MessageState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, MessageState::Pending)
    }
}

/// A persisted chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub sent_at: DateTime<Utc>,
    pub from_user_id: UserId,
    pub to_user_id: UserId,
    pub text: String,
    pub state: MessageState,
}

/// A message that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub chat_id: ChatId,
    pub sent_at: DateTime<Utc>,
    pub from_user_id: UserId,
    pub to_user_id: UserId,
    pub text: String,
    pub state: MessageState,
}

impl NewMessage {
    /// Builds a `Pending` message stamped with the current UTC time.
    pub fn pending(from: UserId, to: UserId, text: String) -> Self {
        Self {
            chat_id: ChatId::for_participants(&from, &to),
            sent_at: Utc::now(),
            from_user_id: from,
            to_user_id: to,
            text,
            state: MessageState::Pending,
        }
    }
}

/// Input of the send-message operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendMessage {
    pub from: UserId,
    pub to: UserId,
    pub text: String,
}

/// Input of the get-messages operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetMessages {
    pub from: UserId,
    pub to: UserId,
}

/// The two externally triggered message transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum CommandKind {
    #[strum(serialize = "CommitMessage")]
    #[serde(rename = "CommitMessage")]
    Commit,
    #[strum(serialize = "RollbackMessage")]
    #[serde(rename = "RollbackMessage")]
    Rollback,
}

impl CommandKind {
    /// State a pending message moves to when this command is applied.
    pub fn target_state(self) -> MessageState {
        match self {
            CommandKind::Commit => MessageState::Sent,
            CommandKind::Rollback => MessageState::Removed,
        }
    }
}

/// A commit or rollback request for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageCommand {
    pub correlation_id: CorrelationId,
    pub message_id: MessageId,
}

/// Result of applying a commit or rollback command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The message moved from `Pending` to the target state.
    Applied { to: MessageState },
    /// The correlation id was already in the ledger; nothing changed.
    AlreadyHandled,
    /// The message was already terminal; the correlation id is now recorded
    /// but the state is unchanged.
    AlreadyTerminal(MessageState),
}

impl CommandOutcome {
    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            CommandOutcome::Applied { .. } => "applied",
            CommandOutcome::AlreadyHandled => "duplicate",
            CommandOutcome::AlreadyTerminal(_) => "terminal",
        }
    }
}

/// Per-call context passed explicitly through every engine entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// Request id taken from the caller or generated on entry.
    pub request_id: String,
    /// Entry point that produced the call (`http`, `intake`, ...).
    pub origin: &'static str,
}

impl RequestContext {
    /// Context with a freshly generated request id.
    pub fn new(origin: &'static str) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            origin,
        }
    }

    /// Context carrying a caller-supplied request id.
    pub fn with_request_id(origin: &'static str, request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            origin,
        }
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the role an adapter plays.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Publisher,
    CommandSource,
    Observability,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    #[test]
    fn chat_id_puts_smaller_id_first() {
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");
        assert_eq!(ChatId::for_participants(&alice, &bob).as_str(), "alice_bob");
        assert_eq!(ChatId::for_participants(&bob, &alice).as_str(), "alice_bob");
    }

    #[test]
    fn chat_id_with_self() {
        let u = UserId::new("carol");
        assert_eq!(ChatId::for_participants(&u, &u).as_str(), "carol_carol");
    }

    #[test]
    fn message_state_round_trips_through_strings() {
        for state in [MessageState::Pending, MessageState::Sent, MessageState::Removed] {
            let s = state.to_string();
            assert_eq!(MessageState::from_str(&s).unwrap(), state);
        }
        assert_eq!(MessageState::Sent.to_string(), "sent");
        assert!(MessageState::from_str("archived").is_err());
    }

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!MessageState::Pending.is_terminal());
        assert!(MessageState::Sent.is_terminal());
        assert!(MessageState::Removed.is_terminal());
    }

    #[test]
    fn command_kind_wire_names() {
        assert_eq!(CommandKind::Commit.to_string(), "CommitMessage");
        assert_eq!(
            CommandKind::from_str("RollbackMessage").unwrap(),
            CommandKind::Rollback
        );
        assert_eq!(CommandKind::Commit.target_state(), MessageState::Sent);
        assert_eq!(CommandKind::Rollback.target_state(), MessageState::Removed);
    }

    #[test]
    fn pending_message_derives_chat_id() {
        let msg = NewMessage::pending(UserId::new("zed"), UserId::new("amy"), "hi".into());
        assert_eq!(msg.chat_id.as_str(), "amy_zed");
        assert_eq!(msg.state, MessageState::Pending);
        assert_eq!(msg.from_user_id.as_str(), "zed");
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(CorrelationId::generate(), CorrelationId::generate());
        assert_ne!(
            RequestContext::new("test").request_id,
            RequestContext::new("test").request_id
        );
    }

    proptest! {
        #[test]
        fn chat_id_is_symmetric(a in "[a-z0-9]{0,12}", b in "[a-z0-9]{0,12}") {
            let ua = UserId::new(a);
            let ub = UserId::new(b);
            prop_assert_eq!(
                ChatId::for_participants(&ua, &ub),
                ChatId::for_participants(&ub, &ua)
            );
        }
    }
}
