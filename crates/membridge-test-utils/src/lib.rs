// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for membridge integration tests.
//!
//! Provides a scripted classifier oracle and a harness that wires a complete
//! [`MemoryBridge`](membridge_pipeline::MemoryBridge) over a temp database,
//! with no network access and no model download.
//!
//! # Components
//!
//! - [`MockOracle`] - Classifier oracle with pre-configured answers
//! - [`TestHarness`] - Bridge over a temp SQLite file and a hashing embedder

pub mod harness;
pub mod mock_oracle;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_oracle::MockOracle;
