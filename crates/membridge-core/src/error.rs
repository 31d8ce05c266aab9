// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the membridge memory bridge.

use thiserror::Error;

/// The primary error type used across all membridge crates.
///
/// Variants map onto the failure taxonomy of the bridge:
/// transport and storage failures are retryable and surfaced to callers,
/// oracle failures are recovered inside the decision engine, `NotFound` is
/// reportable but non-fatal, and `Validation` is rejected at the boundary.
#[derive(Debug, Error)]
pub enum MembridgeError {
    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Network or remote-service failures (HTTP errors, unreachable hosts).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The classifier oracle produced no usable answer.
    #[error("oracle error: {message}")]
    Oracle { message: String },

    /// No memory record exists with the given id.
    #[error("memory not found: {id}")]
    NotFound { id: String },

    /// Input rejected before any work was done.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MembridgeError {
    /// Returns true if retrying the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MembridgeError::Storage { .. }
                | MembridgeError::Transport { .. }
                | MembridgeError::Timeout { .. }
        )
    }

    /// Wraps any error as a storage failure.
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        MembridgeError::Storage {
            source: Box::new(source),
        }
    }

    /// Builds a transport error with an optional underlying cause.
    pub fn transport(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        MembridgeError::Transport {
            message: message.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(MembridgeError::storage(std::io::Error::other("disk")).is_retryable());
        assert!(MembridgeError::transport("503", None).is_retryable());
        assert!(
            MembridgeError::Timeout {
                duration: std::time::Duration::from_secs(1)
            }
            .is_retryable()
        );
        assert!(!MembridgeError::NotFound { id: "x".into() }.is_retryable());
        assert!(!MembridgeError::Validation("empty".into()).is_retryable());
        assert!(!MembridgeError::Oracle { message: "bad json".into() }.is_retryable());
    }

    #[test]
    fn display_includes_id() {
        let err = MembridgeError::NotFound {
            id: "deadbeef".into(),
        };
        assert_eq!(err.to_string(), "memory not found: deadbeef");
    }
}
