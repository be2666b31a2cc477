// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound side of the broker.

use async_trait::async_trait;

use crate::error::ColloquyError;
use crate::traits::adapter::PluginAdapter;

/// One claimed inbound command.
///
/// Every delivery must end in exactly one of [`CommandSource::ack`],
/// [`CommandSource::nack`] or [`CommandSource::reject`]. A delivery that is
/// never settled is handed out again once its lock expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub id: i64,
    pub payload: String,
    /// Number of earlier failed attempts.
    pub attempt: u32,
    /// Opaque claim token. Settling with a lease that is no longer current
    /// leaves the delivery untouched.
    pub lease: String,
}

/// Source of externally produced commands with at-least-once delivery.
#[async_trait]
pub trait CommandSource: PluginAdapter {
    /// Claims the next delivery, or `None` when nothing is waiting.
    async fn receive(&self) -> Result<Option<Delivery>, ColloquyError>;

    /// The command was applied; never deliver it again.
    async fn ack(&self, delivery: &Delivery) -> Result<(), ColloquyError>;

    /// Processing failed transiently; deliver again later.
    async fn nack(&self, delivery: &Delivery, reason: &str) -> Result<(), ColloquyError>;

    /// The delivery can never succeed; drop it.
    async fn reject(&self, delivery: &Delivery, reason: &str) -> Result<(), ColloquyError>;
}
