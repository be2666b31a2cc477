// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command intake: pulls commit/rollback commands from a [`CommandSource`]
//! and applies them through the [`DialogueEngine`].
//!
//! A delivery is acknowledged only after the engine returned. Transient
//! failures are handed back for redelivery; envelopes that can never succeed
//! (malformed, unknown command, missing message) are rejected.

use std::sync::Arc;
use std::time::Duration;

use colloquy_core::{
    ColloquyError, CommandKind, CommandOutcome, CommandSource, Delivery, InboundCommand,
    RequestContext,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dialogue::DialogueEngine;

/// How a delivery was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Applied (or recognised as a duplicate) and acknowledged.
    Acked(CommandOutcome),
    /// Handed back to the source for a later attempt.
    Retried,
    /// Dropped for good.
    Rejected,
}

/// Consumer of inbound commands.
pub struct CommandIntake {
    engine: DialogueEngine,
    source: Arc<dyn CommandSource>,
    poll_interval: Duration,
}

impl CommandIntake {
    pub fn new(
        engine: DialogueEngine,
        source: Arc<dyn CommandSource>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            engine,
            source,
            poll_interval,
        }
    }

    /// Claim and settle one delivery. `Ok(None)` means the source was empty.
    pub async fn process_next(&self) -> Result<Option<Settlement>, ColloquyError> {
        match self.source.receive().await? {
            Some(delivery) => self.process(delivery).await.map(Some),
            None => Ok(None),
        }
    }

    async fn process(&self, delivery: Delivery) -> Result<Settlement, ColloquyError> {
        let inbound = match InboundCommand::decode(&delivery.payload) {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!(delivery_id = delivery.id, error = %e, "rejecting undecodable command");
                self.source.reject(&delivery, &e.to_string()).await?;
                record("unknown", "rejected");
                return Ok(Settlement::Rejected);
            }
        };

        let ctx = RequestContext::with_request_id(
            "intake",
            inbound.command.correlation_id.as_str(),
        );
        let result = match inbound.kind {
            CommandKind::Commit => self.engine.commit_message(&ctx, inbound.command).await,
            CommandKind::Rollback => self.engine.rollback_message(&ctx, inbound.command).await,
        };
        let kind = inbound.kind.to_string();

        match result {
            Ok(outcome) => {
                self.source.ack(&delivery).await?;
                record(&kind, outcome.label());
                Ok(Settlement::Acked(outcome))
            }
            Err(e) if e.is_retryable() => {
                warn!(
                    delivery_id = delivery.id,
                    attempt = delivery.attempt,
                    request_id = %ctx.request_id,
                    error = %e,
                    "command failed, returning it for redelivery"
                );
                self.source.nack(&delivery, &e.to_string()).await?;
                record(&kind, "retry");
                Ok(Settlement::Retried)
            }
            Err(e) => {
                warn!(
                    delivery_id = delivery.id,
                    request_id = %ctx.request_id,
                    error = %e,
                    "command can never succeed, rejecting"
                );
                self.source.reject(&delivery, &e.to_string()).await?;
                record(&kind, "rejected");
                Ok(Settlement::Rejected)
            }
        }
    }

    /// Process deliveries until `cancel` fires, sleeping `poll_interval`
    /// whenever the source is empty or failing.
    pub async fn run_worker(self: Arc<Self>, worker: usize, cancel: CancellationToken) {
        debug!(worker, "intake worker started");
        while !cancel.is_cancelled() {
            match self.process_next().await {
                Ok(Some(_)) => continue,
                Ok(None) => {}
                Err(e) => warn!(worker, error = %e, "intake poll failed"),
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
        debug!(worker, "intake worker stopped");
    }

    /// Spawn `workers` independent worker loops.
    pub fn spawn_workers(
        self: Arc<Self>,
        workers: usize,
        cancel: CancellationToken,
    ) -> Vec<JoinHandle<()>> {
        info!(workers, source = self.source.name(), "command intake started");
        (0..workers)
            .map(|worker| tokio::spawn(self.clone().run_worker(worker, cancel.clone())))
            .collect()
    }
}

#[cfg(feature = "prometheus")]
fn record(kind: &str, outcome: &'static str) {
    colloquy_prometheus::record_command(kind, outcome);
}

#[cfg(not(feature = "prometheus"))]
fn record(_kind: &str, _outcome: &'static str) {}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_core::{
        CorrelationId, MessageId, MessageState, SendMessage, UserId,
    };
    use colloquy_storage::queries::{inbox, messages};
    use colloquy_storage::{Database, InboxStatus, SqliteCommandSource};
    use tempfile::tempdir;

    struct Fixture {
        engine: DialogueEngine,
        db: Database,
        source: Arc<SqliteCommandSource>,
        intake: Arc<CommandIntake>,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("intake.db").to_str().unwrap())
            .await
            .unwrap();
        let engine = DialogueEngine::new(db.clone());
        let source = Arc::new(SqliteCommandSource::new(
            db.clone(),
            Duration::from_secs(60),
            5,
        ));
        let intake = Arc::new(CommandIntake::new(
            engine.clone(),
            source.clone(),
            Duration::from_millis(10),
        ));
        Fixture {
            engine,
            db,
            source,
            intake,
            _dir: dir,
        }
    }

    async fn pending_message(engine: &DialogueEngine) -> MessageId {
        engine
            .send_message(
                &RequestContext::new("test"),
                SendMessage {
                    from: UserId::new("alice"),
                    to: UserId::new("bob"),
                    text: "hi".into(),
                },
            )
            .await
            .unwrap()
    }

    fn envelope(kind: CommandKind, correlation: &str, id: MessageId) -> String {
        InboundCommand::new(kind, CorrelationId(correlation.into()), id)
            .encode()
            .unwrap()
    }

    #[tokio::test]
    async fn commit_is_applied_and_acked() {
        let f = fixture().await;
        let id = pending_message(&f.engine).await;
        let delivery = f.source.enqueue(&envelope(CommandKind::Commit, "X", id)).await.unwrap();

        let settled = f.intake.process_next().await.unwrap();
        assert_eq!(
            settled,
            Some(Settlement::Acked(CommandOutcome::Applied {
                to: MessageState::Sent
            }))
        );
        let entry = inbox::get_entry(&f.db, delivery).await.unwrap().unwrap();
        assert_eq!(entry.status, InboxStatus::Completed);
        let message = messages::get_message(&f.db, id).await.unwrap().unwrap();
        assert_eq!(message.state, MessageState::Sent);

        assert_eq!(f.intake.process_next().await.unwrap(), None);
        f.db.close().await.unwrap();
    }

    #[tokio::test]
    async fn redelivered_command_is_acked_as_duplicate() {
        let f = fixture().await;
        let id = pending_message(&f.engine).await;
        let payload = envelope(CommandKind::Rollback, "R", id);
        f.source.enqueue(&payload).await.unwrap();
        f.source.enqueue(&payload).await.unwrap();

        f.intake.process_next().await.unwrap();
        let second = f.intake.process_next().await.unwrap();
        assert_eq!(second, Some(Settlement::Acked(CommandOutcome::AlreadyHandled)));

        let message = messages::get_message(&f.db, id).await.unwrap().unwrap();
        assert_eq!(message.state, MessageState::Removed);
        assert_eq!(
            inbox::count_by_status(&f.db, InboxStatus::Completed).await.unwrap(),
            2
        );
        f.db.close().await.unwrap();
    }

    #[tokio::test]
    async fn unknown_command_is_rejected_and_worker_continues() {
        let f = fixture().await;
        let id = pending_message(&f.engine).await;
        let bad = f
            .source
            .enqueue(r#"{"correlationId":"B","command":"ArchiveMessage","payload":{"messageId":1}}"#)
            .await
            .unwrap();
        f.source.enqueue(&envelope(CommandKind::Commit, "G", id)).await.unwrap();

        assert_eq!(f.intake.process_next().await.unwrap(), Some(Settlement::Rejected));
        let entry = inbox::get_entry(&f.db, bad).await.unwrap().unwrap();
        assert_eq!(entry.status, InboxStatus::Rejected);

        assert!(matches!(
            f.intake.process_next().await.unwrap(),
            Some(Settlement::Acked(_))
        ));
        f.db.close().await.unwrap();
    }

    #[tokio::test]
    async fn missing_message_is_rejected() {
        let f = fixture().await;
        f.source
            .enqueue(&envelope(CommandKind::Commit, "M", MessageId(999)))
            .await
            .unwrap();
        assert_eq!(f.intake.process_next().await.unwrap(), Some(Settlement::Rejected));
        f.db.close().await.unwrap();
    }

    #[tokio::test]
    async fn store_failure_is_nacked_for_redelivery() {
        let f = fixture().await;
        let id = pending_message(&f.engine).await;
        let delivery = f.source.enqueue(&envelope(CommandKind::Commit, "S", id)).await.unwrap();
        f.db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("DROP TABLE handled_commands;")?;
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(f.intake.process_next().await.unwrap(), Some(Settlement::Retried));
        let entry = inbox::get_entry(&f.db, delivery).await.unwrap().unwrap();
        assert_eq!(entry.status, InboxStatus::Pending);
        assert_eq!(entry.attempts, 1);
        let message = messages::get_message(&f.db, id).await.unwrap().unwrap();
        assert_eq!(message.state, MessageState::Pending);
        f.db.close().await.unwrap();
    }

    #[tokio::test]
    async fn workers_drain_the_inbox_and_stop_on_cancel() {
        let f = fixture().await;
        let mut ids = Vec::new();
        for n in 0..5 {
            let id = pending_message(&f.engine).await;
            f.source
                .enqueue(&envelope(CommandKind::Commit, &format!("w{n}"), id))
                .await
                .unwrap();
            ids.push(id);
        }

        let cancel = CancellationToken::new();
        let handles = f.intake.clone().spawn_workers(2, cancel.clone());

        for _ in 0..200 {
            if inbox::count_by_status(&f.db, InboxStatus::Completed).await.unwrap() == 5 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        cancel.cancel();
        for handle in handles {
            tokio::time::timeout(Duration::from_secs(2), handle)
                .await
                .expect("worker should stop promptly")
                .unwrap();
        }

        for id in ids {
            let message = messages::get_message(&f.db, id).await.unwrap().unwrap();
            assert_eq!(message.state, MessageState::Sent);
        }
        f.db.close().await.unwrap();
    }
}
