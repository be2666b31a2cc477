// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound command envelope.
//!
//! Wire shape: `{"correlationId": "...", "command": "CommitMessage", "payload": {"messageId": 1}}`.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ColloquyError;
use crate::types::{CommandKind, CorrelationId, MessageCommand, MessageId};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    correlation_id: String,
    command: String,
    payload: Payload,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Payload {
    message_id: i64,
}

/// A decoded commit or rollback command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundCommand {
    pub kind: CommandKind,
    pub command: MessageCommand,
}

impl InboundCommand {
    pub fn new(kind: CommandKind, correlation_id: CorrelationId, message_id: MessageId) -> Self {
        Self {
            kind,
            command: MessageCommand {
                correlation_id,
                message_id,
            },
        }
    }

    /// Decodes an envelope. Unknown command names and empty correlation ids
    /// are codec errors.
    pub fn decode(raw: &str) -> Result<Self, ColloquyError> {
        let envelope: Envelope = serde_json::from_str(raw)
            .map_err(|e| ColloquyError::codec(format!("malformed command envelope: {e}")))?;
        let kind = CommandKind::from_str(&envelope.command)
            .map_err(|_| ColloquyError::codec(format!("unknown command {:?}", envelope.command)))?;
        if envelope.correlation_id.trim().is_empty() {
            return Err(ColloquyError::codec("command envelope has empty correlationId"));
        }
        Ok(Self::new(
            kind,
            CorrelationId(envelope.correlation_id),
            MessageId(envelope.payload.message_id),
        ))
    }

    pub fn encode(&self) -> Result<String, ColloquyError> {
        let envelope = Envelope {
            correlation_id: self.command.correlation_id.0.clone(),
            command: self.kind.to_string(),
            payload: Payload {
                message_id: self.command.message_id.0,
            },
        };
        serde_json::to_string(&envelope)
            .map_err(|e| ColloquyError::codec(format!("encode command envelope: {e}")))
    }
}
