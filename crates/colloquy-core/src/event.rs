// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed outbox events.
//!
//! Every event kind has an [`OutboxEventType`] tag with a stable integer code
//! (stored in the outbox `type` column) and its own encode/decode pair. A row
//! whose tag is not listed here fails to decode with a codec error.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ColloquyError;
use crate::types::{ChatId, CorrelationId, MessageId, UserId};

/// Type tag of an outbox row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum OutboxEventType {
    #[strum(serialize = "AddNewUnreadMessage")]
    NewUnreadMessage,
}

impl OutboxEventType {
    /// Integer code persisted in the outbox `type` column.
    pub fn code(self) -> i64 {
        match self {
            OutboxEventType::NewUnreadMessage => 1,
        }
    }

    pub fn from_code(code: i64) -> Result<Self, ColloquyError> {
        match code {
            1 => Ok(OutboxEventType::NewUnreadMessage),
            other => Err(ColloquyError::codec(format!(
                "unknown outbox event type {other}"
            ))),
        }
    }
}

/// A recipient has one more unread message in a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUnreadMessage {
    pub correlation_id: CorrelationId,
    /// The recipient of the message.
    pub user_id: UserId,
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// An integration event waiting in the outbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboxEvent {
    NewUnreadMessage(NewUnreadMessage),
}

impl OutboxEvent {
    pub fn event_type(&self) -> OutboxEventType {
        match self {
            OutboxEvent::NewUnreadMessage(_) => OutboxEventType::NewUnreadMessage,
        }
    }

    /// Broker partition key.
    pub fn key(&self) -> &str {
        match self {
            OutboxEvent::NewUnreadMessage(e) => e.chat_id.as_str(),
        }
    }

    /// Encodes the event body as JSON.
    pub fn encode(&self) -> Result<String, ColloquyError> {
        let encoded = match self {
            OutboxEvent::NewUnreadMessage(e) => serde_json::to_string(e),
        };
        encoded.map_err(|e| ColloquyError::codec(format!("encode outbox event: {e}")))
    }

    /// Decodes a stored row body using the decoder registered for `code`.
    pub fn decode(code: i64, value: &str) -> Result<Self, ColloquyError> {
        match OutboxEventType::from_code(code)? {
            OutboxEventType::NewUnreadMessage => serde_json::from_str(value)
                .map(OutboxEvent::NewUnreadMessage)
                .map_err(|e| ColloquyError::codec(format!("decode AddNewUnreadMessage: {e}"))),
        }
    }
}

/// What a publisher puts on the wire: a tagged key/value pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRecord {
    pub event_type: OutboxEventType,
    pub key: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OutboxEvent {
        OutboxEvent::NewUnreadMessage(NewUnreadMessage {
            correlation_id: CorrelationId("c-1".into()),
            user_id: UserId::new("bob"),
            chat_id: ChatId("alice_bob".into()),
            message_id: MessageId(12),
        })
    }

    #[test]
    fn encodes_camel_case_fields() {
        let json = sample().encode().unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["correlationId"], "c-1");
        assert_eq!(v["userId"], "bob");
        assert_eq!(v["chatId"], "alice_bob");
        assert_eq!(v["messageId"], 12);
    }

    #[test]
    fn keyed_by_chat_and_decodes_back() {
        let event = sample();
        assert_eq!(event.key(), "alice_bob");
        assert_eq!(event.event_type(), OutboxEventType::NewUnreadMessage);
        let value = event.encode().unwrap();
        assert_eq!(
            OutboxEvent::decode(event.event_type().code(), &value).unwrap(),
            sample()
        );
    }

    #[test]
    fn unknown_tag_is_a_codec_error() {
        let err = OutboxEvent::decode(99, "{}").unwrap_err();
        assert!(matches!(err, ColloquyError::Codec { .. }));
    }

    #[test]
    fn malformed_body_is_a_codec_error() {
        let err = OutboxEvent::decode(1, r#"{"chatId":"x"}"#).unwrap_err();
        assert!(matches!(err, ColloquyError::Codec { .. }));
    }

    #[test]
    fn tag_name_is_stable() {
        assert_eq!(
            OutboxEventType::NewUnreadMessage.to_string(),
            "AddNewUnreadMessage"
        );
    }
}
