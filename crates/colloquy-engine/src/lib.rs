// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runtime core of the Colloquy chat backend.
//!
//! - [`DialogueEngine`] sends, lists, commits and rolls back messages
//! - [`OutboxDispatcher`] drains the outbox to an [`EventPublisher`](colloquy_core::EventPublisher)
//! - [`CommandIntake`] applies inbound commands from a [`CommandSource`](colloquy_core::CommandSource)
//! - [`shutdown`] ties them to process signals

pub mod dialogue;
pub mod dispatcher;
pub mod intake;
pub mod shutdown;

pub use dialogue::DialogueEngine;
pub use dispatcher::{DispatchReport, OutboxDispatcher};
pub use intake::{CommandIntake, Settlement};
