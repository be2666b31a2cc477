// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and lifecycle.
//!
//! All statements are serialized through tokio-rusqlite's single background
//! thread, so two transactions never interleave inside one process.

use std::path::Path;
use std::time::Duration;

use colloquy_core::ColloquyError;
use tracing::debug;

use crate::migrations::run_migrations;

/// Convert a tokio-rusqlite error into `ColloquyError::Storage`.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> ColloquyError {
    ColloquyError::Storage {
        source: Box::new(e),
    }
}

/// Connection settings applied on open.
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    pub wal_mode: bool,
    pub busy_timeout: Duration,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            wal_mode: true,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// What a unit of work asks [`Database::transaction`] to do with its changes.
#[derive(Debug)]
pub enum TxOutcome<R> {
    Commit(R),
    Rollback(R),
}

/// Handle to the SQLite database. Cheap to clone; clones share one connection.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Open (or create) the database at `path` with default options.
    pub async fn open(path: &str) -> Result<Self, ColloquyError> {
        Self::open_with(path, DatabaseOptions::default()).await
    }

    /// Open (or create) the database, apply pragmas and run pending migrations.
    pub async fn open_with(path: &str, options: DatabaseOptions) -> Result<Self, ColloquyError> {
        // Migrations need an owned `&mut Connection`; run them before handing
        // the file to the background thread.
        let migrate_path = path.to_string();
        let wal_mode = options.wal_mode;
        tokio::task::spawn_blocking(move || -> Result<(), ColloquyError> {
            if let Some(parent) = Path::new(&migrate_path).parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent).map_err(ColloquyError::storage)?;
            }
            let mut conn =
                rusqlite::Connection::open(&migrate_path).map_err(ColloquyError::storage)?;
            if wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")
                    .map_err(ColloquyError::storage)?;
            }
            run_migrations(&mut conn)
        })
        .await
        .map_err(|e| ColloquyError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(ColloquyError::storage)?;
        let busy_ms = options.busy_timeout.as_millis() as i64;
        conn.call(move |conn| -> Result<(), rusqlite::Error> {
            conn.pragma_update(None, "foreign_keys", "ON")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.pragma_update(None, "busy_timeout", busy_ms)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The underlying tokio-rusqlite connection.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Run `work` inside one SQLite transaction.
    ///
    /// The closure decides whether to commit or roll back. An `Err` from the
    /// closure rolls everything back and is returned as a storage error.
    pub async fn transaction<F, R>(&self, work: F) -> Result<R, ColloquyError>
    where
        F: FnOnce(&rusqlite::Transaction<'_>) -> Result<TxOutcome<R>, rusqlite::Error>
            + Send
            + 'static,
        R: Send + 'static,
    {
        self.conn
            .call(move |conn| -> Result<R, rusqlite::Error> {
                let tx = conn.transaction()?;
                match work(&tx)? {
                    TxOutcome::Commit(r) => {
                        tx.commit()?;
                        Ok(r)
                    }
                    TxOutcome::Rollback(r) => {
                        tx.rollback()?;
                        Ok(r)
                    }
                }
            })
            .await
            .map_err(map_tr_err)
    }

    /// Close the connection, stopping the background thread.
    pub async fn close(self) -> Result<(), ColloquyError> {
        self.conn.close().await.map_err(map_tr_err)
    }
}
