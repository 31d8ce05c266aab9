// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the membridge memory bridge.
//!
//! This crate provides the error taxonomy, the adapter traits, and the small
//! set of common types shared by every other crate in the workspace. Embedders
//! and classifier oracles implement the traits defined here.

pub mod error;
pub mod traits;
pub mod types;

pub use error::MembridgeError;
pub use traits::{ClassifierOracle, EmbeddingAdapter, PluginAdapter};
pub use types::{
    AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus, OracleRequest, OracleResponse,
};
