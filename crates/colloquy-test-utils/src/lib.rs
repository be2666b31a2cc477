// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Colloquy integration tests.
//!
//! Provides a mock broker publisher and a harness that wires the runtime to a
//! temp SQLite database, so tests run without external services.
//!
//! # Components
//!
//! - [`MockPublisher`] - Captures published records, can simulate broker outages
//! - [`TestHarness`] - Engine, dispatcher and intake over a temp database

pub mod harness;
pub mod mock_publisher;

pub use harness::TestHarness;
pub use mock_publisher::MockPublisher;
