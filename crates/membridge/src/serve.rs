// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `membridge serve` command implementation.

use membridge_config::MembridgeConfig;
use membridge_core::MembridgeError;
use membridge_gateway::{start_server, AuthConfig, GatewayState, ServerConfig};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::setup::{init_tracing, open_bridge};

/// Run the HTTP gateway until SIGINT or SIGTERM, then close the store.
pub async fn run_serve(config: MembridgeConfig) -> Result<(), MembridgeError> {
    init_tracing(&config);

    let bridge = open_bridge(&config, true).await?;
    let status = bridge.health().await?;
    info!(
        oracle = %status.oracle,
        embedder = %status.embedder,
        content_policy = %status.content_policy,
        memories = status.count,
        "membridge ready"
    );

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        auth: AuthConfig {
            bearer_token: config.server.bearer_token.clone(),
        },
    };

    let cancel = install_signal_handler();
    let result = start_server(
        &server_config,
        GatewayState::new(bridge.clone()),
        cancel.cancelled_owned(),
    )
    .await;

    bridge.shutdown().await?;
    info!("membridge serve shutdown complete");
    result
}

/// Cancel the returned token on SIGINT (Ctrl+C) or SIGTERM.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                        _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to install SIGTERM handler, using Ctrl+C only");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}
