// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded schema migrations.
//!
//! The SQL files under `migrations/` are compiled into the binary and applied
//! on every [`Database::open`](crate::Database::open).

use colloquy_core::ColloquyError;
use tracing::info;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Apply all pending migrations. Refinery records progress in
/// `refinery_schema_history`, so repeated calls are no-ops.
pub fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), ColloquyError> {
    let report = embedded::migrations::runner()
        .run(conn)
        .map_err(ColloquyError::storage)?;
    let applied = report.applied_migrations().len();
    if applied > 0 {
        info!(applied, "database migrations applied");
    }
    Ok(())
}
