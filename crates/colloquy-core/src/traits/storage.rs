// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends.

use async_trait::async_trait;

use crate::error::ColloquyError;
use crate::traits::adapter::PluginAdapter;

/// Adapter for storage and persistence backends.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), ColloquyError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), ColloquyError>;
}
