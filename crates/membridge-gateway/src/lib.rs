// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the memory bridge.
//!
//! Serves the bridge operations as JSON endpoints on axum, with optional
//! bearer-token auth and permissive CORS for browser extensions.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;

pub use auth::AuthConfig;
pub use error::ApiError;
pub use server::{build_router, start_server, GatewayState, ServerConfig};
