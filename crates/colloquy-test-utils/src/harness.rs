// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the whole runtime against a temp SQLite database:
//! dialogue engine, outbox dispatcher wired to a [`MockPublisher`], and
//! command intake reading the SQLite inbox.

use std::sync::Arc;
use std::time::Duration;

use colloquy_config::model::StorageConfig;
use colloquy_core::{
    ColloquyError, CommandKind, CorrelationId, InboundCommand, MessageId, RequestContext,
    SendMessage, StorageAdapter, UserId,
};
use colloquy_engine::{CommandIntake, DialogueEngine, DispatchReport, OutboxDispatcher, Settlement};
use colloquy_storage::{Database, SqliteCommandSource, SqliteStorage};

use crate::mock_publisher::MockPublisher;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    dispatch_interval: Duration,
    intake_poll_interval: Duration,
    lock_timeout: Duration,
    max_attempts: u32,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            dispatch_interval: Duration::from_millis(20),
            intake_poll_interval: Duration::from_millis(10),
            lock_timeout: Duration::from_secs(60),
            max_attempts: 5,
        }
    }

    /// Interval used by dispatchers created with [`TestHarness::dispatcher`].
    pub fn with_dispatch_interval(mut self, interval: Duration) -> Self {
        self.dispatch_interval = interval;
        self
    }

    /// Delivery attempts before an inbox entry is parked as failed.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, ColloquyError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| ColloquyError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let storage = SqliteStorage::new(StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
            busy_timeout_ms: 5000,
        });
        storage.initialize().await?;
        let db = storage.database()?.clone();

        let engine = DialogueEngine::new(db.clone());
        let publisher = Arc::new(MockPublisher::new());
        let source = Arc::new(SqliteCommandSource::new(
            db.clone(),
            self.lock_timeout,
            self.max_attempts,
        ));
        let intake = Arc::new(CommandIntake::new(
            engine.clone(),
            source.clone(),
            self.intake_poll_interval,
        ));

        Ok(TestHarness {
            storage: Arc::new(storage),
            db,
            engine,
            publisher,
            source,
            intake,
            dispatch_interval: self.dispatch_interval,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete test environment with a mock broker and temp storage.
pub struct TestHarness {
    /// SQLite storage adapter (temp DB, cleaned up on drop).
    pub storage: Arc<SqliteStorage>,
    /// Shared database handle.
    pub db: Database,
    pub engine: DialogueEngine,
    /// The mock broker every dispatcher publishes to.
    pub publisher: Arc<MockPublisher>,
    /// Inbound command queue.
    pub source: Arc<SqliteCommandSource>,
    pub intake: Arc<CommandIntake>,
    dispatch_interval: Duration,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A dispatcher publishing to [`TestHarness::publisher`].
    pub fn dispatcher(&self) -> OutboxDispatcher {
        OutboxDispatcher::new(
            self.db.clone(),
            self.publisher.clone(),
            self.dispatch_interval,
        )
    }

    /// Send a message from `from` to `to`.
    pub async fn send(&self, from: &str, to: &str, text: &str) -> Result<MessageId, ColloquyError> {
        self.engine
            .send_message(
                &RequestContext::new("test"),
                SendMessage {
                    from: UserId::new(from),
                    to: UserId::new(to),
                    text: text.to_string(),
                },
            )
            .await
    }

    /// Run one dispatch cycle.
    pub async fn dispatch_once(&self) -> Result<DispatchReport, ColloquyError> {
        self.dispatcher().dispatch_once().await
    }

    /// Put a commit or rollback envelope on the inbound queue.
    pub async fn enqueue_command(
        &self,
        kind: CommandKind,
        correlation_id: &str,
        message_id: MessageId,
    ) -> Result<i64, ColloquyError> {
        let payload =
            InboundCommand::new(kind, CorrelationId(correlation_id.to_string()), message_id)
                .encode()?;
        self.source.enqueue(&payload).await
    }

    /// Settle inbound deliveries until the queue is empty.
    pub async fn drain_commands(&self) -> Result<Vec<Settlement>, ColloquyError> {
        let mut settled = Vec::new();
        while let Some(settlement) = self.intake.process_next().await? {
            settled.push(settlement);
        }
        Ok(settled)
    }
}
