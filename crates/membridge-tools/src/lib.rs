// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool definitions for driving the memory bridge from an agent runtime.
//!
//! Each memory operation is a fixed [`Tool`] implementation holding an
//! `Arc<MemoryBridge>`; [`ToolRegistry`] indexes them by name and emits
//! `{name, description, input_schema}` definitions.

pub mod builtin;
pub mod tool;

pub use builtin::register_memory_tools;
pub use tool::{Tool, ToolOutput, ToolRegistry};
