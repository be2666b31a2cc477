// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use colloquy_config::model::StorageConfig;
use colloquy_core::{AdapterType, ColloquyError, HealthStatus, PluginAdapter, StorageAdapter};

use crate::database::{Database, DatabaseOptions, map_tr_err};

/// SQLite-backed storage adapter.
///
/// The database is opened by [`StorageAdapter::initialize`]; until then
/// [`SqliteStorage::database`] returns an error.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// The connection is not opened until `initialize` is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// The opened database handle.
    pub fn database(&self) -> Result<&Database, ColloquyError> {
        self.db.get().ok_or_else(|| ColloquyError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }

    async fn checkpoint(db: &Database) -> Result<(), ColloquyError> {
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ColloquyError> {
        let Some(db) = self.db.get() else {
            return Ok(HealthStatus::Unhealthy("not initialized".into()));
        };
        match db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
        {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), ColloquyError> {
        if let Some(db) = self.db.get() {
            Self::checkpoint(db).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), ColloquyError> {
        let options = DatabaseOptions {
            wal_mode: self.config.wal_mode,
            busy_timeout: Duration::from_millis(self.config.busy_timeout_ms),
        };
        let db = Database::open_with(&self.config.database_path, options).await?;
        self.db.set(db).map_err(|_| ColloquyError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), ColloquyError> {
        let db = self.database()?;
        Self::checkpoint(db).await?;
        db.clone().close().await?;
        debug!("storage closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config(dir: &tempfile::TempDir) -> StorageConfig {
        StorageConfig {
            database_path: dir.path().join("adapter.db").to_string_lossy().into_owned(),
            wal_mode: true,
            busy_timeout_ms: 1000,
        }
    }

    #[tokio::test]
    async fn lifecycle() {
        let dir = tempdir().unwrap();
        let storage = SqliteStorage::new(config(&dir));
        assert!(storage.database().is_err());
        assert_eq!(
            storage.health_check().await.unwrap(),
            HealthStatus::Unhealthy("not initialized".into())
        );

        storage.initialize().await.unwrap();
        assert_eq!(storage.health_check().await.unwrap(), HealthStatus::Healthy);
        assert!(storage.initialize().await.is_err());

        storage.shutdown().await.unwrap();
        storage.close().await.unwrap();
    }
}
