// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbox dispatcher: drains unsent outbox rows to the broker.
//!
//! Delivery is at-least-once. A cycle reads every unsent row, publishes them
//! in id order and stops at the first retryable publish failure. Rows are
//! only marked sent when the whole cycle published cleanly; after a failure
//! the rows already published in that cycle are published again on the next
//! one. A row the broker refuses permanently is skipped like an undecodable
//! one and stays unsent.
//!
//! Retries happen on the fixed poll interval with no backoff and no cap.

use std::sync::Arc;
use std::time::{Duration, Instant};

use colloquy_core::{ColloquyError, EventPublisher, OutboundRecord, OutboxEvent};
use colloquy_storage::Database;
use colloquy_storage::queries::outbox;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What one dispatch cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Unsent rows read at the start of the cycle.
    pub fetched: usize,
    /// Rows the broker accepted this cycle.
    pub published: usize,
    /// Rows that could not be decoded or that the broker permanently refused.
    pub skipped: usize,
    /// Rows flagged sent at the end of the cycle.
    pub marked: usize,
    /// Whether a publish failure cut the cycle short.
    pub aborted: bool,
}

/// Periodic outbox drain bound to a cancellation token.
pub struct OutboxDispatcher {
    db: Database,
    publisher: Arc<dyn EventPublisher>,
    interval: Duration,
}

impl OutboxDispatcher {
    pub fn new(db: Database, publisher: Arc<dyn EventPublisher>, interval: Duration) -> Self {
        Self {
            db,
            publisher,
            interval,
        }
    }

    /// Run a single dispatch cycle.
    ///
    /// Returns `Err` only when the outbox could not be read or the sent flags
    /// could not be written; publish failures are reported through
    /// [`DispatchReport::aborted`].
    pub async fn dispatch_once(&self) -> Result<DispatchReport, ColloquyError> {
        let started = Instant::now();
        let rows = outbox::fetch_unsent(&self.db).await?;
        let mut report = DispatchReport {
            fetched: rows.len(),
            ..DispatchReport::default()
        };
        let mut published_ids = Vec::with_capacity(rows.len());

        for row in rows {
            let event = match OutboxEvent::decode(row.event_type, &row.value) {
                Ok(event) => event,
                Err(e) => {
                    warn!(
                        outbox_id = row.id,
                        event_type = row.event_type,
                        error = %e,
                        "skipping undecodable outbox row"
                    );
                    report.skipped += 1;
                    continue;
                }
            };
            let record = OutboundRecord {
                event_type: event.event_type(),
                key: row.key,
                value: row.value,
            };

            if let Err(e) = self.publisher.publish(&record).await {
                if !e.is_retryable() {
                    warn!(
                        outbox_id = row.id,
                        key = ?record.key,
                        error = %e,
                        "skipping outbox row the broker cannot accept"
                    );
                    report.skipped += 1;
                    continue;
                }
                warn!(
                    outbox_id = row.id,
                    key = %record.key,
                    published_this_cycle = published_ids.len(),
                    error = %e,
                    "publish failed, abandoning dispatch cycle"
                );
                report.aborted = true;
                break;
            }
            published_ids.push(row.id);
        }
        report.published = published_ids.len();

        if !report.aborted {
            report.marked = outbox::mark_sent(&self.db, published_ids).await?;
        }

        #[cfg(feature = "prometheus")]
        colloquy_prometheus::record_dispatch(
            report.fetched,
            report.published,
            report.skipped,
            report.aborted,
            started.elapsed().as_secs_f64(),
        );

        if report.fetched > 0 {
            debug!(
                fetched = report.fetched,
                published = report.published,
                skipped = report.skipped,
                marked = report.marked,
                aborted = report.aborted,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "dispatch cycle finished"
            );
        }
        Ok(report)
    }

    /// Dispatch on a fixed interval until `cancel` fires.
    ///
    /// Cancellation is only observed between cycles; a cycle in progress
    /// always runs to completion.
    pub async fn run(self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            interval_ms = self.interval.as_millis() as u64,
            publisher = self.publisher.name(),
            "outbox dispatcher started"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.dispatch_once().await {
                        warn!(error = %e, "dispatch cycle failed, retrying next interval");
                    }
                }
            }
        }

        info!("outbox dispatcher stopped");
    }
}
