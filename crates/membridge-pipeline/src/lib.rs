// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Orchestration layer of the memory bridge.
//!
//! [`IngestionPipeline`] runs retrieval, the gatekeeper decision, and the
//! resulting store mutation for one piece of text. [`MemoryBridge`] is the
//! long-lived service object every transport (HTTP, CLI, shell, tools) calls.

pub mod bridge;
pub mod ingest;

pub use bridge::{build_embedder, AddMemory, BridgeStatus, MemoryBridge};
pub use ingest::{ActionResult, IngestOutcome, IngestRequest, IngestionPipeline, PipelineOptions};
