// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`CommandSource`] backed by the `inbox` table.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use colloquy_core::{
    AdapterType, ColloquyError, CommandSource, Delivery, HealthStatus, PluginAdapter,
};

use crate::database::Database;
use crate::models::InboxStatus;
use crate::queries::inbox;

/// Durable inbound command queue.
#[derive(Clone)]
pub struct SqliteCommandSource {
    db: Database,
    lock_timeout: Duration,
    max_attempts: u32,
}

impl SqliteCommandSource {
    pub fn new(db: Database, lock_timeout: Duration, max_attempts: u32) -> Self {
        Self {
            db,
            lock_timeout,
            max_attempts,
        }
    }

    /// Durably store a raw command envelope. Returns its delivery id.
    pub async fn enqueue(&self, payload: &str) -> Result<i64, ColloquyError> {
        let id = inbox::enqueue(&self.db, payload, self.max_attempts).await?;
        debug!(delivery_id = id, "command enqueued");
        Ok(id)
    }

    /// Release locks left behind by a crashed process.
    pub async fn reclaim_expired(&self) -> Result<usize, ColloquyError> {
        let reclaimed = inbox::reclaim_expired(&self.db).await?;
        if reclaimed > 0 {
            warn!(reclaimed, "reclaimed inbox entries with expired locks");
        }
        Ok(reclaimed)
    }
}

#[async_trait]
impl PluginAdapter for SqliteCommandSource {
    fn name(&self) -> &str {
        "sqlite-inbox"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::CommandSource
    }

    async fn health_check(&self) -> Result<HealthStatus, ColloquyError> {
        let failed = inbox::count_by_status(&self.db, InboxStatus::Failed).await?;
        if failed > 0 {
            Ok(HealthStatus::Degraded(format!("{failed} failed inbox entries")))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }

    async fn shutdown(&self) -> Result<(), ColloquyError> {
        Ok(())
    }
}

#[async_trait]
impl CommandSource for SqliteCommandSource {
    async fn receive(&self) -> Result<Option<Delivery>, ColloquyError> {
        let entry = inbox::claim(&self.db, self.lock_timeout).await?;
        Ok(entry.map(|e| Delivery {
            id: e.id,
            payload: e.payload,
            attempt: e.attempts,
            lease: e.locked_until.unwrap_or_default(),
        }))
    }

    async fn ack(&self, delivery: &Delivery) -> Result<(), ColloquyError> {
        if !inbox::ack(&self.db, delivery.id, &delivery.lease).await? {
            stale_settlement(delivery, "ack");
        }
        Ok(())
    }

    async fn nack(&self, delivery: &Delivery, reason: &str) -> Result<(), ColloquyError> {
        match inbox::nack(&self.db, delivery.id, &delivery.lease, reason).await? {
            Some(InboxStatus::Failed) => warn!(
                delivery_id = delivery.id,
                attempts = delivery.attempt + 1,
                reason,
                "delivery exhausted its attempts"
            ),
            Some(_) => {}
            None => stale_settlement(delivery, "nack"),
        }
        Ok(())
    }

    async fn reject(&self, delivery: &Delivery, reason: &str) -> Result<(), ColloquyError> {
        if !inbox::reject(&self.db, delivery.id, &delivery.lease, reason).await? {
            stale_settlement(delivery, "reject");
        }
        Ok(())
    }
}

fn stale_settlement(delivery: &Delivery, action: &str) {
    warn!(
        delivery_id = delivery.id,
        action,
        "lock expired before settlement, leaving the entry to its current holder"
    );
}
