// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Colloquy chat backend.

use thiserror::Error;

/// The primary error type used across all Colloquy adapter traits and core operations.
#[derive(Debug, Error)]
pub enum ColloquyError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, constraint violation).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Broker errors (publish rejected, endpoint unreachable, inbound queue failure).
    #[error("broker error: {message}")]
    Broker {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An outbox payload or inbound command envelope could not be encoded or decoded.
    #[error("codec error: {message}")]
    Codec { message: String },

    /// Caller supplied an argument the engine refuses to act on.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The message targeted by a command does not exist.
    #[error("message {id} not found")]
    MessageNotFound { id: i64 },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ColloquyError {
    /// Wraps any error as a storage failure.
    pub fn storage(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        ColloquyError::Storage {
            source: Box::new(e),
        }
    }

    /// Builds a codec error from a message.
    pub fn codec(message: impl Into<String>) -> Self {
        ColloquyError::Codec {
            message: message.into(),
        }
    }

    /// Whether retrying the same operation later may succeed.
    ///
    /// Storage, broker and timeout failures are transient. Codec errors,
    /// invalid input and missing messages fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ColloquyError::Storage { .. }
                | ColloquyError::Broker { .. }
                | ColloquyError::Timeout { .. }
        )
    }
}
