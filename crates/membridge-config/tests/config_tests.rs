// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the membridge configuration system.

use membridge_config::diagnostic::ConfigError;
use membridge_config::{
    load_and_validate_path, load_and_validate_str, load_config_from_path, load_config_from_str,
    ContentPolicy, EmbeddingBackend, OracleKind,
};

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[bridge]
name = "desk-bridge"
log_level = "debug"

[server]
host = "0.0.0.0"
port = 9000
bearer_token = "s3cret"

[storage]
database_path = "/tmp/memories.db"
wal_mode = false

[embedding]
backend = "hashing"
dimensions = 256

[retrieval]
context_k = 4
search_k = 10
threshold = 1.2
weak_threshold = 1.6

[memory]
source_footer = true

[gatekeeper]
oracle = "ollama"
content_policy = "summarize"
temperature = 0.2
timeout_secs = 15

[ollama]
base_url = "http://gpu-box:11434"
model = "llama3.2"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.bridge.name, "desk-bridge");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.bearer_token.as_deref(), Some("s3cret"));
    assert!(!config.storage.wal_mode);
    assert_eq!(config.embedding.backend, EmbeddingBackend::Hashing);
    assert_eq!(config.embedding.dimensions, 256);
    assert_eq!(config.retrieval.threshold, 1.2);
    assert_eq!(config.retrieval.weak_threshold, Some(1.6));
    assert!(config.memory.source_footer);
    assert_eq!(config.gatekeeper.oracle, OracleKind::Ollama);
    assert_eq!(config.gatekeeper.content_policy, ContentPolicy::Summarize);
    assert_eq!(config.ollama.model, "llama3.2");
    // Untouched sections keep their defaults.
    assert_eq!(config.gemini.model, "gemini-2.0-flash");
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_and_validate_str("").expect("defaults are valid");
    assert_eq!(config.retrieval.threshold, 1.5);
    assert_eq!(config.gatekeeper.content_policy, ContentPolicy::Verbatim);
    assert_eq!(config.gatekeeper.oracle, OracleKind::Gemini);
    assert_eq!(config.server.port, 8000);
}

#[test]
fn unknown_key_gets_suggestion() {
    let toml = r#"
[retrieval]
treshold = 1.0
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            valid_keys,
            ..
        } => {
            assert_eq!(key, "treshold");
            assert_eq!(suggestion.as_deref(), Some("threshold"));
            assert!(valid_keys.contains("weak_threshold"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_section_is_rejected() {
    let toml = r#"
[chroma]
path = "./memory_db"
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject unknown section");
    assert!(matches!(errors[0], ConfigError::UnknownKey { .. }));
}

#[test]
fn bad_content_policy_is_reported() {
    let toml = r#"
[gatekeeper]
content_policy = "paraphrase"
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject variant");
    assert!(
        errors[0].to_string().contains("content_policy")
            || errors[0].to_string().contains("paraphrase"),
        "got: {}",
        errors[0]
    );
}

#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[server]
port = "eight thousand"
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject type");
    assert!(matches!(errors[0], ConfigError::InvalidType { .. }));
}

#[test]
fn semantic_validation_runs_after_parse() {
    let toml = r#"
[retrieval]
threshold = 1.5
weak_threshold = 1.4
"#;
    let errors = load_and_validate_str(toml).expect_err("weak below strict");
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}

#[test]
fn env_overrides_file_values() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "bridge.toml",
            r#"
[retrieval]
threshold = 1.0

[storage]
database_path = "/from/file.db"
"#,
        )?;
        jail.set_env("MEMBRIDGE_RETRIEVAL_THRESHOLD", "1.25");
        jail.set_env("MEMBRIDGE_GATEKEEPER_CONTENT_POLICY", "summarize");

        let config = load_config_from_path(std::path::Path::new("bridge.toml"))?;
        assert_eq!(config.retrieval.threshold, 1.25);
        assert_eq!(config.gatekeeper.content_policy, ContentPolicy::Summarize);
        assert_eq!(config.storage.database_path, "/from/file.db");
        Ok(())
    });
}

#[test]
fn validated_path_load_reports_file_errors() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("bad.toml", "[server]\nprot = 1\n")?;
        let errors = load_and_validate_path(std::path::Path::new("bad.toml"))
            .expect_err("should reject typo");
        match &errors[0] {
            ConfigError::UnknownKey { suggestion, .. } => {
                assert_eq!(suggestion.as_deref(), Some("port"));
            }
            other => panic!("expected UnknownKey, got {other:?}"),
        }
        Ok(())
    });
}
