// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classifier oracle trait: a language model that answers a structured prompt.

use async_trait::async_trait;

use crate::error::MembridgeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{OracleRequest, OracleResponse};

/// A language model used by the gatekeeper to classify input.
///
/// Implementations only move text: they send the prompt and return whatever
/// the model produced. Parsing and fallback happen in the caller.
#[async_trait]
pub trait ClassifierOracle: PluginAdapter {
    /// Sends one prompt and returns the raw model output.
    async fn classify(&self, request: OracleRequest) -> Result<OracleResponse, MembridgeError>;
}
