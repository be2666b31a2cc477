// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Colloquy chat backend.
//!
//! Defines the domain types (messages, chat ids, commands), the typed outbox
//! events, the error type, and the adapter traits at the seams between the
//! dialogue engine, storage and the broker.

pub mod command;
pub mod error;
pub mod event;
pub mod traits;
pub mod types;

pub use command::InboundCommand;
pub use error::ColloquyError;
pub use event::{NewUnreadMessage, OutboundRecord, OutboxEvent, OutboxEventType};
pub use types::{
    AdapterType, ChatId, CommandKind, CommandOutcome, CorrelationId, GetMessages, HealthStatus,
    Message, MessageCommand, MessageId, MessageState, NewMessage, RequestContext, SendMessage,
    UserId,
};

pub use traits::{CommandSource, Delivery, EventPublisher, PluginAdapter, StorageAdapter};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_type_round_trip() {
        use std::str::FromStr;

        for variant in [
            AdapterType::Storage,
            AdapterType::Publisher,
            AdapterType::CommandSource,
            AdapterType::Observability,
        ] {
            let s = variant.to_string();
            assert_eq!(AdapterType::from_str(&s).expect("should parse back"), variant);
        }
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        assert_ne!(HealthStatus::Degraded("slow".into()), healthy);
        assert_ne!(HealthStatus::Unhealthy("down".into()), healthy);
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_event_publisher<T: EventPublisher>() {}
        fn _assert_command_source<T: CommandSource>() {}
    }
}
