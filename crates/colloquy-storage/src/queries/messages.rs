// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message store.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use colloquy_core::{ChatId, ColloquyError, Message, MessageId, MessageState, NewMessage, UserId};
use rusqlite::{OptionalExtension, params};

use super::parse_err;
use crate::database::{Database, map_tr_err};

const MESSAGE_COLUMNS: &str =
    "message_id, chat_id, sent_at, from_user_id, to_user_id, text, state";

/// Fixed-width UTC timestamp; sorts lexicographically in time order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn row_to_message(row: &rusqlite::Row<'_>) -> Result<Message, rusqlite::Error> {
    let sent_at: String = row.get(2)?;
    let state: String = row.get(6)?;
    Ok(Message {
        id: MessageId(row.get(0)?),
        chat_id: ChatId(row.get(1)?),
        sent_at: DateTime::parse_from_rfc3339(&sent_at)
            .map_err(|e| parse_err(2, e))?
            .with_timezone(&Utc),
        from_user_id: UserId(row.get(3)?),
        to_user_id: UserId(row.get(4)?),
        text: row.get(5)?,
        state: MessageState::from_str(&state).map_err(|e| parse_err(6, e))?,
    })
}

/// Insert a message and return its assigned id.
pub fn insert(conn: &rusqlite::Connection, message: &NewMessage) -> Result<MessageId, rusqlite::Error> {
    conn.execute(
        "INSERT INTO messages (chat_id, sent_at, from_user_id, to_user_id, text, state)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            message.chat_id.as_str(),
            format_timestamp(&message.sent_at),
            message.from_user_id.as_str(),
            message.to_user_id.as_str(),
            message.text,
            message.state.to_string(),
        ],
    )?;
    Ok(MessageId(conn.last_insert_rowid()))
}

/// Load one message by id.
pub fn find(conn: &rusqlite::Connection, id: MessageId) -> Result<Option<Message>, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE message_id = ?1"),
        params![id.0],
        row_to_message,
    )
    .optional()
}

/// Move a `pending` message to `to`. Returns `false` when the message is
/// not pending, leaving it untouched.
pub fn transition_from_pending(
    conn: &rusqlite::Connection,
    id: MessageId,
    to: MessageState,
) -> Result<bool, rusqlite::Error> {
    let changed = conn.execute(
        "UPDATE messages SET state = ?1 WHERE message_id = ?2 AND state = 'pending'",
        params![to.to_string(), id.0],
    )?;
    Ok(changed == 1)
}

/// Messages of a chat in one state, newest first. Equal timestamps fall back
/// to the higher id first.
pub fn list_in_chat(
    conn: &rusqlite::Connection,
    chat_id: &ChatId,
    state: MessageState,
) -> Result<Vec<Message>, rusqlite::Error> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MESSAGE_COLUMNS} FROM messages
         WHERE chat_id = ?1 AND state = ?2
         ORDER BY sent_at DESC, message_id DESC"
    ))?;
    let rows = stmt.query_map(params![chat_id.as_str(), state.to_string()], row_to_message)?;
    rows.collect()
}

/// Load one message by id.
pub async fn get_message(db: &Database, id: MessageId) -> Result<Option<Message>, ColloquyError> {
    db.connection()
        .call(move |conn| -> Result<Option<Message>, rusqlite::Error> { find(conn, id) })
        .await
        .map_err(map_tr_err)
}

/// Messages of a chat in one state, newest first.
pub async fn chat_messages(
    db: &Database,
    chat_id: &ChatId,
    state: MessageState,
) -> Result<Vec<Message>, ColloquyError> {
    let chat_id = chat_id.clone();
    db.connection()
        .call(move |conn| -> Result<Vec<Message>, rusqlite::Error> {
            list_in_chat(conn, &chat_id, state)
        })
        .await
        .map_err(map_tr_err)
}

/// Total number of stored messages.
pub async fn count(db: &Database) -> Result<i64, ColloquyError> {
    db.connection()
        .call(|conn| -> Result<i64, rusqlite::Error> {
            conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
        })
        .await
        .map_err(map_tr_err)
}
