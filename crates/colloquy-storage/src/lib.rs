// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the Colloquy chat backend.
//!
//! WAL-mode SQLite with embedded migrations and a single-writer connection
//! via `tokio-rusqlite`. Holds the message store, the outbox, the command
//! ledger and the inbound command queue, plus a transaction helper that
//! spans all of them.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod source;

pub use adapter::SqliteStorage;
pub use database::{Database, DatabaseOptions, TxOutcome};
pub use models::*;
pub use source::SqliteCommandSource;
