// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The gatekeeper: decides whether new text becomes a memory.
//!
//! [`DecisionEngine::decide`] turns `(input, context, force_save)` into a
//! [`Decision`] with intent SAVE, UPDATE, or DISCARD. The language model is a
//! [`ClassifierOracle`](membridge_core::ClassifierOracle); whatever it does,
//! the engine always returns a decision, falling back to a raw SAVE when the
//! oracle fails.

pub mod decision;
pub mod engine;
pub mod parse;
pub mod prompt;

pub use decision::{Decision, Intent, RAW_FALLBACK_TAG, UNKNOWN_TARGET};
pub use engine::{DecisionEngine, DecisionRequest, GatekeeperSettings};
