// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types that only exist at the storage boundary.

use strum::{Display, EnumString};

/// One row of the `outbox` table, before its body is decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxRow {
    pub id: i64,
    /// Integer event type code.
    pub event_type: i64,
    pub key: String,
    pub value: String,
    pub is_sent: bool,
}

/// Status of an inbox entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum InboxStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Rejected,
}

/// One row of the `inbox` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxEntry {
    pub id: i64,
    pub payload: String,
    pub status: InboxStatus,
    pub attempts: u32,
    pub max_attempts: u32,
    pub last_error: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub locked_until: Option<String>,
}
