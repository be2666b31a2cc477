// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade; without an installed recorder every call is
//! a no-op.

use metrics::{describe_counter, describe_gauge, describe_histogram};

/// Register all Colloquy metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!("colloquy_messages_sent_total", "Messages accepted by send");
    describe_counter!(
        "colloquy_outbox_published_total",
        "Outbox records confirmed by the broker"
    );
    describe_counter!(
        "colloquy_outbox_publish_failures_total",
        "Dispatch cycles aborted by a publish failure"
    );
    describe_counter!(
        "colloquy_outbox_undecodable_total",
        "Outbox rows skipped because they could not be decoded"
    );
    describe_gauge!(
        "colloquy_outbox_backlog",
        "Unsent outbox rows seen by the last dispatch cycle"
    );
    describe_histogram!(
        "colloquy_dispatch_cycle_seconds",
        "Duration of one outbox dispatch cycle"
    );
    describe_counter!(
        "colloquy_commands_total",
        "Inbound commands by kind and outcome"
    );
}

/// Record an accepted message.
pub fn record_message_sent() {
    metrics::counter!("colloquy_messages_sent_total").increment(1);
}

/// Record the result of one dispatch cycle.
pub fn record_dispatch(backlog: usize, published: usize, skipped: usize, failed: bool, seconds: f64) {
    metrics::gauge!("colloquy_outbox_backlog").set(backlog as f64);
    metrics::counter!("colloquy_outbox_published_total").increment(published as u64);
    metrics::counter!("colloquy_outbox_undecodable_total").increment(skipped as u64);
    if failed {
        metrics::counter!("colloquy_outbox_publish_failures_total").increment(1);
    }
    metrics::histogram!("colloquy_dispatch_cycle_seconds").record(seconds);
}

/// Record a processed command. `outcome` is `applied`, `duplicate`,
/// `terminal`, `rejected` or `retry`.
pub fn record_command(kind: &str, outcome: &'static str) {
    metrics::counter!(
        "colloquy_commands_total",
        "kind" => kind.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}
