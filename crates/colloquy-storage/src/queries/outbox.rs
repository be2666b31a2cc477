// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbox store.
//!
//! Rows are appended inside the transaction that produced the event and are
//! never deleted. The dispatcher is the only writer of `is_sent`.

use colloquy_core::{ColloquyError, OutboxEvent};
use rusqlite::params;

use super::conversion_err;
use crate::database::{Database, map_tr_err};
use crate::models::OutboxRow;

/// Ids per `UPDATE ... IN (...)` statement when marking rows sent.
const MARK_CHUNK: usize = 500;

/// Append an event to the outbox. Returns the row id.
pub fn insert(conn: &rusqlite::Connection, event: &OutboxEvent) -> Result<i64, rusqlite::Error> {
    let value = event.encode().map_err(conversion_err)?;
    conn.execute(
        "INSERT INTO outbox (type, message_key, message_value) VALUES (?1, ?2, ?3)",
        params![event.event_type().code(), event.key(), value],
    )?;
    Ok(conn.last_insert_rowid())
}

fn row_to_outbox(row: &rusqlite::Row<'_>) -> Result<OutboxRow, rusqlite::Error> {
    Ok(OutboxRow {
        id: row.get(0)?,
        event_type: row.get(1)?,
        key: row.get(2)?,
        value: row.get(3)?,
        is_sent: row.get(4)?,
    })
}

/// Every row not yet confirmed by the broker, in insertion order.
pub async fn fetch_unsent(db: &Database) -> Result<Vec<OutboxRow>, ColloquyError> {
    db.connection()
        .call(|conn| -> Result<Vec<OutboxRow>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, type, message_key, message_value, is_sent
                 FROM outbox WHERE is_sent = 0 ORDER BY id ASC",
            )?;
            let rows = stmt.query_map([], row_to_outbox)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Mark rows sent in one transaction. Returns the number of rows changed.
pub async fn mark_sent(db: &Database, ids: Vec<i64>) -> Result<usize, ColloquyError> {
    if ids.is_empty() {
        return Ok(0);
    }
    db.connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            let tx = conn.transaction()?;
            let mut changed = 0;
            for chunk in ids.chunks(MARK_CHUNK) {
                let placeholders = vec!["?"; chunk.len()].join(", ");
                changed += tx.execute(
                    &format!("UPDATE outbox SET is_sent = 1 WHERE id IN ({placeholders})"),
                    rusqlite::params_from_iter(chunk.iter()),
                )?;
            }
            tx.commit()?;
            Ok(changed)
        })
        .await
        .map_err(map_tr_err)
}

/// Number of rows waiting for dispatch.
pub async fn count_unsent(db: &Database) -> Result<i64, ColloquyError> {
    db.connection()
        .call(|conn| -> Result<i64, rusqlite::Error> {
            conn.query_row("SELECT COUNT(*) FROM outbox WHERE is_sent = 0", [], |row| {
                row.get(0)
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Load one row by id, sent or not.
pub async fn get_row(db: &Database, id: i64) -> Result<Option<OutboxRow>, ColloquyError> {
    use rusqlite::OptionalExtension;

    db.connection()
        .call(move |conn| -> Result<Option<OutboxRow>, rusqlite::Error> {
            conn.query_row(
                "SELECT id, type, message_key, message_value, is_sent FROM outbox WHERE id = ?1",
                params![id],
                row_to_outbox,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
