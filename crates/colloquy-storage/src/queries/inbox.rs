// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbox queue for inbound commands.
//!
//! A claimed entry is `processing` until `locked_until`. If the worker dies
//! before settling it, the lock expires, the expiry counts as a failed
//! attempt and the entry is claimable again.
//!
//! The `locked_until` stamp written by a claim doubles as its lease: ack,
//! nack and reject only touch an entry that is still held under that lease,
//! so a worker whose lock expired cannot settle someone else's claim.

use std::str::FromStr;
use std::time::Duration;

use colloquy_core::ColloquyError;
use rusqlite::{OptionalExtension, params};

use super::parse_err;
use crate::database::{Database, map_tr_err};
use crate::models::{InboxEntry, InboxStatus};

const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

fn row_to_entry(row: &rusqlite::Row<'_>) -> Result<InboxEntry, rusqlite::Error> {
    let status: String = row.get(2)?;
    Ok(InboxEntry {
        id: row.get(0)?,
        payload: row.get(1)?,
        status: InboxStatus::from_str(&status).map_err(|e| parse_err(2, e))?,
        attempts: row.get(3)?,
        max_attempts: row.get(4)?,
        last_error: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        locked_until: row.get(8)?,
    })
}

const ENTRY_COLUMNS: &str = "id, payload, status, attempts, max_attempts, last_error, \
                             created_at, updated_at, locked_until";

/// Append a command payload. Returns the entry id.
pub async fn enqueue(db: &Database, payload: &str, max_attempts: u32) -> Result<i64, ColloquyError> {
    let payload = payload.to_string();
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.execute(
                "INSERT INTO inbox (payload, max_attempts) VALUES (?1, ?2)",
                params![payload, max_attempts],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Expired locks go back to `pending` with one more attempt, or to `failed`
/// once that reaches `max_attempts`.
fn expire_locks_sql() -> String {
    format!(
        "UPDATE inbox SET attempts = attempts + 1,
         status = CASE WHEN attempts + 1 >= max_attempts THEN 'failed' ELSE 'pending' END,
         last_error = 'processing lock expired',
         locked_until = NULL, updated_at = {NOW}
         WHERE status = 'processing' AND locked_until < {NOW}"
    )
}

/// Claim the oldest pending entry after releasing expired locks.
///
/// The entry becomes `processing` and stays invisible to other claims for
/// `lock_timeout`. Its `locked_until` is the lease the settlement calls
/// expect. Returns `None` when nothing is claimable.
pub async fn claim(db: &Database, lock_timeout: Duration) -> Result<Option<InboxEntry>, ColloquyError> {
    let lock_modifier = format!("+{} seconds", lock_timeout.as_secs().max(1));
    db.connection()
        .call(move |conn| -> Result<Option<InboxEntry>, rusqlite::Error> {
            let tx = conn.transaction()?;
            tx.execute(&expire_locks_sql(), [])?;

            let next: Option<i64> = tx
                .query_row(
                    "SELECT id FROM inbox WHERE status = 'pending' ORDER BY id ASC LIMIT 1",
                    [],
                    |row| row.get(0),
                )
                .optional()?;

            let Some(id) = next else {
                tx.commit()?;
                return Ok(None);
            };

            tx.execute(
                &format!(
                    "UPDATE inbox SET status = 'processing',
                     locked_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', ?1),
                     updated_at = {NOW}
                     WHERE id = ?2 AND status = 'pending'"
                ),
                params![lock_modifier, id],
            )?;
            let claimed = tx.query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM inbox WHERE id = ?1"),
                params![id],
                row_to_entry,
            )?;
            tx.commit()?;
            Ok(Some(claimed))
        })
        .await
        .map_err(map_tr_err)
}

/// Mark an entry completed.
///
/// Returns `false` when the entry is no longer held under `lease`.
pub async fn ack(db: &Database, id: i64, lease: &str) -> Result<bool, ColloquyError> {
    let lease = lease.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                &format!(
                    "UPDATE inbox SET status = 'completed', locked_until = NULL,
                     updated_at = {NOW}
                     WHERE id = ?1 AND status = 'processing' AND locked_until = ?2"
                ),
                params![id, lease],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Record a failed attempt.
///
/// The entry goes back to `pending` for redelivery, or to `failed` once its
/// attempts reach `max_attempts`. Returns the resulting status, or `None`
/// when the entry is no longer held under `lease`.
pub async fn nack(
    db: &Database,
    id: i64,
    lease: &str,
    reason: &str,
) -> Result<Option<InboxStatus>, ColloquyError> {
    let lease = lease.to_string();
    let reason = reason.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<InboxStatus>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let held: Option<(u32, u32)> = tx
                .query_row(
                    "SELECT attempts, max_attempts FROM inbox
                     WHERE id = ?1 AND status = 'processing' AND locked_until = ?2",
                    params![id, lease],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            let Some((attempts, max_attempts)) = held else {
                tx.commit()?;
                return Ok(None);
            };

            let attempts = attempts + 1;
            let status = if attempts >= max_attempts {
                InboxStatus::Failed
            } else {
                InboxStatus::Pending
            };
            tx.execute(
                &format!(
                    "UPDATE inbox SET status = ?1, attempts = ?2, last_error = ?3,
                     locked_until = NULL, updated_at = {NOW} WHERE id = ?4"
                ),
                params![status.to_string(), attempts, reason, id],
            )?;
            tx.commit()?;
            Ok(Some(status))
        })
        .await
        .map_err(map_tr_err)
}

/// Park an entry that can never be processed.
///
/// Returns `false` when the entry is no longer held under `lease`.
pub async fn reject(db: &Database, id: i64, lease: &str, reason: &str) -> Result<bool, ColloquyError> {
    let lease = lease.to_string();
    let reason = reason.to_string();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                &format!(
                    "UPDATE inbox SET status = 'rejected', last_error = ?1,
                     locked_until = NULL, updated_at = {NOW}
                     WHERE id = ?2 AND status = 'processing' AND locked_until = ?3"
                ),
                params![reason, id, lease],
            )?;
            Ok(changed == 1)
        })
        .await
        .map_err(map_tr_err)
}

/// Release every expired lock. Each release counts as a failed attempt.
pub async fn reclaim_expired(db: &Database) -> Result<usize, ColloquyError> {
    db.connection()
        .call(|conn| -> Result<usize, rusqlite::Error> { conn.execute(&expire_locks_sql(), []) })
        .await
        .map_err(map_tr_err)
}

/// Load one entry by id.
pub async fn get_entry(db: &Database, id: i64) -> Result<Option<InboxEntry>, ColloquyError> {
    db.connection()
        .call(move |conn| -> Result<Option<InboxEntry>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {ENTRY_COLUMNS} FROM inbox WHERE id = ?1"),
                params![id],
                row_to_entry,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Number of entries in a status.
pub async fn count_by_status(db: &Database, status: InboxStatus) -> Result<i64, ColloquyError> {
    let status = status.to_string();
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM inbox WHERE status = ?1",
                params![status],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)
}
