// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Startup wiring shared by every subcommand.

use std::sync::Arc;

use async_trait::async_trait;
use membridge_config::{MembridgeConfig, OracleKind};
use membridge_core::{
    AdapterType, ClassifierOracle, HealthStatus, MembridgeError, OracleRequest, OracleResponse,
    PluginAdapter,
};
use membridge_pipeline::MemoryBridge;
use tracing::warn;

/// Workspace crates whose logs follow `bridge.log_level`.
const LOG_TARGETS: &[&str] = &[
    "membridge",
    "membridge_config",
    "membridge_memory",
    "membridge_gatekeeper",
    "membridge_gemini",
    "membridge_ollama",
    "membridge_pipeline",
    "membridge_tools",
    "membridge_gateway",
];

/// Default filter: our crates at `log_level`, everything else at warn.
fn filter_directives(log_level: &str) -> String {
    let mut directives = vec!["warn".to_string()];
    directives.extend(LOG_TARGETS.iter().map(|t| format!("{t}={log_level}")));
    directives.join(",")
}

/// Filter used when `RUST_LOG` is unset, driven by `bridge.log_level`.
fn default_filter(config: &MembridgeConfig) -> String {
    filter_directives(&config.bridge.log_level)
}

/// Initialize the tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing(config: &MembridgeConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(config)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Build the oracle selected by `gatekeeper.oracle`.
pub fn build_oracle(config: &MembridgeConfig) -> Result<Arc<dyn ClassifierOracle>, MembridgeError> {
    match config.gatekeeper.oracle {
        #[cfg(feature = "gemini")]
        OracleKind::Gemini => Ok(Arc::new(membridge_gemini::GeminiOracle::new(&config.gemini)?)),
        #[cfg(feature = "ollama")]
        OracleKind::Ollama => Ok(Arc::new(membridge_ollama::OllamaOracle::new(&config.ollama)?)),
        #[allow(unreachable_patterns)]
        kind => Err(MembridgeError::Config(format!(
            "oracle '{kind}' is not compiled into this binary"
        ))),
    }
}

/// Open the bridge with the configured oracle.
///
/// With `require_oracle = false` an oracle that cannot be built (say, no API
/// key) is replaced by [`OfflineOracle`], so commands that never classify
/// still work.
pub async fn open_bridge(
    config: &MembridgeConfig,
    require_oracle: bool,
) -> Result<Arc<MemoryBridge>, MembridgeError> {
    let oracle = match build_oracle(config) {
        Ok(oracle) => oracle,
        Err(e) if !require_oracle => {
            warn!(error = %e, "oracle unavailable, gatekeeper disabled for this command");
            Arc::new(OfflineOracle { reason: e.to_string() })
        }
        Err(e) => return Err(e),
    };
    Ok(Arc::new(MemoryBridge::open(config, oracle).await?))
}

/// Stand-in oracle that always fails; ingestion then falls back to raw saves.
pub struct OfflineOracle {
    reason: String,
}

#[async_trait]
impl PluginAdapter for OfflineOracle {
    fn name(&self) -> &str {
        "offline"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Oracle
    }

    async fn health_check(&self) -> Result<HealthStatus, MembridgeError> {
        Ok(HealthStatus::Unhealthy(self.reason.clone()))
    }

    async fn shutdown(&self) -> Result<(), MembridgeError> {
        Ok(())
    }
}

#[async_trait]
impl ClassifierOracle for OfflineOracle {
    async fn classify(&self, _request: OracleRequest) -> Result<OracleResponse, MembridgeError> {
        Err(MembridgeError::Config(self.reason.clone()))
    }
}
