// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod publisher;
pub mod source;
pub mod storage;

pub use adapter::PluginAdapter;
pub use publisher::EventPublisher;
pub use source::{CommandSource, Delivery};
pub use storage::StorageAdapter;
