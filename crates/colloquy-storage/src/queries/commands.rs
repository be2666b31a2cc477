// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command ledger: correlation ids of commands that were already applied.

use colloquy_core::{ColloquyError, CorrelationId};
use rusqlite::params;

use crate::database::{Database, map_tr_err};

/// Whether `id` is in the ledger.
pub fn contains(conn: &rusqlite::Connection, id: &CorrelationId) -> Result<bool, rusqlite::Error> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM handled_commands WHERE correlation_id = ?1)",
        params![id.as_str()],
        |row| row.get(0),
    )
}

/// Record `id` as handled.
///
/// Returns `false` when the primary key rejects the insert because another
/// delivery recorded the same id first. Only the failed statement is undone;
/// the surrounding transaction stays usable.
pub fn record(conn: &rusqlite::Connection, id: &CorrelationId) -> Result<bool, rusqlite::Error> {
    match conn.execute(
        "INSERT INTO handled_commands (correlation_id) VALUES (?1)",
        params![id.as_str()],
    ) {
        Ok(_) => Ok(true),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Whether `id` is in the ledger.
pub async fn is_handled(db: &Database, id: &CorrelationId) -> Result<bool, ColloquyError> {
    let id = id.clone();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> { contains(conn, &id) })
        .await
        .map_err(map_tr_err)
}

/// Number of ledger entries.
pub async fn count(db: &Database) -> Result<i64, ColloquyError> {
    db.connection()
        .call(|conn| -> Result<i64, rusqlite::Error> {
            conn.query_row("SELECT COUNT(*) FROM handled_commands", [], |row| row.get(0))
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::TxOutcome;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn second_record_of_same_id_is_refused() {
        let (db, _dir) = setup_db().await;
        let id = CorrelationId("corr-1".into());

        assert!(!is_handled(&db, &id).await.unwrap());

        let first = id.clone();
        let inserted = db
            .transaction(move |tx| Ok(TxOutcome::Commit(record(tx, &first)?)))
            .await
            .unwrap();
        assert!(inserted);

        let again = id.clone();
        let inserted = db
            .transaction(move |tx| Ok(TxOutcome::Commit(record(tx, &again)?)))
            .await
            .unwrap();
        assert!(!inserted);

        assert!(is_handled(&db, &id).await.unwrap());
        assert_eq!(count(&db).await.unwrap(), 1);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn refused_insert_keeps_transaction_usable() {
        let (db, _dir) = setup_db().await;
        let dup = CorrelationId("dup".into());
        let seed = dup.clone();
        db.transaction(move |tx| Ok(TxOutcome::Commit(record(tx, &seed)?)))
            .await
            .unwrap();

        db.transaction(move |tx| {
            assert!(!record(tx, &dup)?);
            record(tx, &CorrelationId("fresh".into()))?;
            Ok(TxOutcome::Commit(()))
        })
        .await
        .unwrap();

        assert_eq!(count(&db).await.unwrap(), 2);
        db.close().await.unwrap();
    }
}
