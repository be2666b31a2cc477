// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Colloquy chat backend.
//!
//! Exposes sending and reading messages, accepts commit/rollback command
//! envelopes onto the inbound queue, and serves health and metrics.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use error::ApiError;
pub use server::{GatewayState, HealthState, ServerConfig, build_router, serve, start_server};
