// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed statements, grouped per table.
//!
//! Functions taking `&rusqlite::Connection` run inside whatever transaction
//! the caller holds (a `Transaction` derefs to a `Connection`). The async
//! functions taking `&Database` are standalone statements.

pub mod commands;
pub mod inbox;
pub mod messages;
pub mod outbox;

/// Wrap a non-SQLite failure so it can travel through a `call` closure.
pub(crate) fn conversion_err(e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::ToSqlConversionFailure(Box::new(e))
}

/// Error for a text column that failed to parse.
pub(crate) fn parse_err(
    column: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}
