// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound side of the broker.

use async_trait::async_trait;

use crate::error::ColloquyError;
use crate::event::OutboundRecord;
use crate::traits::adapter::PluginAdapter;

/// Publishes outbox records to the broker.
///
/// `Ok(())` means the broker confirmed the record. Any error leaves the
/// outbox row unsent so the dispatcher retries it on a later cycle.
#[async_trait]
pub trait EventPublisher: PluginAdapter {
    async fn publish(&self, record: &OutboundRecord) -> Result<(), ColloquyError>;
}
