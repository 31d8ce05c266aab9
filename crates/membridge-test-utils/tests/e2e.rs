// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests driving a full bridge with a scripted oracle.

use std::collections::HashSet;

use membridge_config::ContentPolicy;
use membridge_core::MembridgeError;
use membridge_gatekeeper::{Intent, RAW_FALLBACK_TAG, UNKNOWN_TARGET};
use membridge_memory::Confidence;
use membridge_pipeline::{ActionResult, AddMemory, IngestRequest};
use membridge_test_utils::TestHarness;

#[tokio::test]
async fn self_match_has_minimum_distance() {
    let h = TestHarness::new().await.unwrap();
    let cat = h
        .bridge
        .add_memory(AddMemory::new("User has a cat named Mochi"))
        .await
        .unwrap();
    h.bridge
        .add_memory(AddMemory::new("User lives in Lisbon"))
        .await
        .unwrap();

    let results = h
        .bridge
        .search_memory("User has a cat named Mochi", Some(4.0), Some(5))
        .await
        .unwrap();
    assert_eq!(results[0].id, cat);
    assert!(results[0].distance < 1e-4);
}

#[tokio::test]
async fn distance_equal_to_threshold_is_excluded() {
    let h = TestHarness::new().await.unwrap();
    let id = h
        .bridge
        .add_memory(AddMemory::new("Favourite tea is genmaicha"))
        .await
        .unwrap();

    let probe = "Favourite tea is sencha";
    let all = h.bridge.search_memory(probe, Some(4.0), Some(1)).await.unwrap();
    let distance = all[0].distance;
    assert!(distance > 0.0);

    let at = h.bridge.search_memory(probe, Some(distance), Some(1)).await.unwrap();
    assert!(at.is_empty());

    let above = h
        .bridge
        .search_memory(probe, Some(distance + 1e-4), Some(1))
        .await
        .unwrap();
    assert_eq!(above[0].id, id);
}

#[tokio::test]
async fn update_round_trip() {
    let h = TestHarness::new().await.unwrap();
    let id = h
        .bridge
        .add_memory(AddMemory::new("Drives a red bicycle"))
        .await
        .unwrap();

    h.bridge
        .update_memory(&id, "Drives a green scooter", None)
        .await
        .unwrap();

    let results = h
        .bridge
        .search_memory("Drives a green scooter", None, None)
        .await
        .unwrap();
    assert_eq!(results[0].id, id);
    assert_eq!(results[0].content, "Drives a green scooter");
    assert!(results.iter().all(|r| r.content != "Drives a red bicycle"));
}

#[tokio::test]
async fn missing_ids_are_not_found() {
    let h = TestHarness::new().await.unwrap();
    let err = h.bridge.update_memory("deadbeef", "x", None).await.unwrap_err();
    assert!(matches!(err, MembridgeError::NotFound { .. }));
    let err = h.bridge.delete_memory("deadbeef").await.unwrap_err();
    assert!(matches!(err, MembridgeError::NotFound { .. }));
}

#[tokio::test]
async fn force_save_keeps_input_verbatim() {
    let h = TestHarness::builder()
        .with_oracle_responses([r#"{"intent":"DISCARD","reason":"acknowledgement"}"#])
        .build()
        .await
        .unwrap();
    let text = "嗯嗯，好的，我知道了。";

    let outcome = h
        .bridge
        .ingest(IngestRequest::new(text).force_save(true))
        .await
        .unwrap();
    assert_eq!(outcome.decision.intent, Intent::Save);
    assert_eq!(outcome.decision.content, text);

    let id = outcome.action_result.memory_id().unwrap().to_string();
    let recent = h.bridge.recent(1).await.unwrap();
    assert_eq!(recent[0].id, id);
    assert_eq!(recent[0].content, text);
}

#[tokio::test]
async fn oracle_failure_falls_back_to_raw_save() {
    let h = TestHarness::builder()
        .with_failing_oracle("connection refused")
        .build()
        .await
        .unwrap();

    let outcome = h.ingest("My passport expires in March 2031").await.unwrap();
    assert_eq!(outcome.decision.intent, Intent::Save);
    assert_eq!(outcome.decision.content, "My passport expires in March 2031");
    assert!(outcome.decision.tags.iter().any(|t| t == RAW_FALLBACK_TAG));

    let record = h.bridge.recent(1).await.unwrap().remove(0);
    assert!(record.tags.contains(RAW_FALLBACK_TAG));
}

#[tokio::test]
async fn unparseable_oracle_answer_falls_back() {
    let h = TestHarness::builder()
        .with_oracle_responses(["I think you should save this!"])
        .build()
        .await
        .unwrap();
    let outcome = h.ingest("Blood type is O negative").await.unwrap();
    assert!(outcome.decision.is_fallback());
    assert!(matches!(outcome.action_result, ActionResult::Saved { .. }));
}

#[tokio::test]
async fn update_without_target_is_skipped() {
    let h = TestHarness::builder()
        .with_oracle_responses([r#"{"intent":"UPDATE","reason":"refines","content":"x"}"#])
        .build()
        .await
        .unwrap();

    let outcome = h
        .bridge
        .ingest(IngestRequest::new("Moved to Porto").context("User lives in Lisbon"))
        .await
        .unwrap();
    assert_eq!(outcome.decision.target_id.as_deref(), Some(UNKNOWN_TARGET));
    assert!(matches!(outcome.action_result, ActionResult::Skipped { .. }));
    assert_eq!(h.bridge.count().await.unwrap(), 0);
}

#[tokio::test]
async fn delete_then_search_omits_record() {
    let h = TestHarness::new().await.unwrap();
    let id = h
        .bridge
        .add_memory(AddMemory::new("Allergic to shellfish"))
        .await
        .unwrap();
    h.bridge.delete_memory(&id).await.unwrap();

    let results = h
        .bridge
        .search_memory("Allergic to shellfish", Some(4.0), None)
        .await
        .unwrap();
    assert!(results.iter().all(|r| r.id != id));
}

#[tokio::test]
async fn ingest_update_rewrites_retrieved_memory() {
    let h = TestHarness::new().await.unwrap();
    let id = h
        .bridge
        .add_memory(AddMemory::new("Works as a nurse in Leeds"))
        .await
        .unwrap();
    h.oracle.push_response(format!(
        r#"{{"intent":"UPDATE","reason":"career change","content":"x","target_id":"{id}"}}"#
    ));

    let outcome = h.ingest("Works as a nurse in Manchester now").await.unwrap();
    assert!(outcome.context_provided);
    assert_eq!(outcome.action_result.memory_id(), Some(id.as_str()));
    assert_eq!(h.bridge.count().await.unwrap(), 1);
    assert!(h.oracle.requests()[0].prompt.contains(&format!("[ID: {id}]")));
}

#[tokio::test]
async fn summarize_policy_stores_oracle_content() {
    let h = TestHarness::builder()
        .with_content_policy(ContentPolicy::Summarize)
        .with_oracle_responses([
            r#"{"intent":"SAVE","reason":"pet","content":"User has a cat named Mochi","tags":["pets"]}"#,
        ])
        .build()
        .await
        .unwrap();

    h.ingest("oh btw my cat is called Mochi haha").await.unwrap();
    let record = h.bridge.recent(1).await.unwrap().remove(0);
    assert_eq!(record.content, "User has a cat named Mochi");
    assert!(record.tags.contains("pets"));
}

#[tokio::test]
async fn boundary_validation_rejects_empty_input() {
    let h = TestHarness::new().await.unwrap();
    for err in [
        h.bridge.add_memory(AddMemory::new("  ")).await.unwrap_err(),
        h.bridge.search_memory("", None, None).await.unwrap_err(),
        h.bridge.search_memory("q", Some(0.0), None).await.unwrap_err(),
        h.bridge.search_memory("q", None, Some(0)).await.unwrap_err(),
        h.ingest("").await.unwrap_err(),
    ] {
        assert!(matches!(err, MembridgeError::Validation(_)), "{err:?}");
    }
}

#[tokio::test]
async fn health_reports_oracle_and_count() {
    let h = TestHarness::new().await.unwrap();
    h.bridge.add_memory(AddMemory::new("Speaks Basque")).await.unwrap();
    let status = h.bridge.health().await.unwrap();
    assert_eq!(status.status, "ok");
    assert_eq!(status.oracle, "mock-oracle");
    assert_eq!(status.content_policy, "verbatim");
    assert_eq!(status.count, 1);
    h.bridge.shutdown().await.unwrap();
}

#[tokio::test]
async fn weak_matches_are_flagged_in_search_and_context() {
    let h = TestHarness::builder()
        .with_weak_threshold(4.0)
        .build()
        .await
        .unwrap();
    let id = h
        .bridge
        .add_memory(AddMemory::new("我住在东京，喜欢吃寿司"))
        .await
        .unwrap();

    let query = "Planning a spring trip to Kyoto";
    let all = h.bridge.search_memory(query, Some(4.0), Some(1)).await.unwrap();
    let distance = all[0].distance;
    assert!(distance >= h.config.retrieval.threshold && distance < 4.0, "{distance}");

    let results = h.bridge.search_memory(query, None, None).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, id);
    assert_eq!(results[0].confidence, Confidence::Weak);

    let outcome = h.ingest(query).await.unwrap();
    assert!(outcome.context_provided);
    let prompt = &h.oracle.requests()[0].prompt;
    assert!(prompt.contains(&format!("[ID: {id}] (low confidence) 我住在东京")), "{prompt}");
}

#[tokio::test]
async fn weak_band_is_off_by_default() {
    let h = TestHarness::new().await.unwrap();
    h.bridge
        .add_memory(AddMemory::new("我住在东京，喜欢吃寿司"))
        .await
        .unwrap();
    let results = h
        .bridge
        .search_memory("Planning a spring trip to Kyoto", None, None)
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn ingest_save_appends_source_footer() {
    let h = TestHarness::builder()
        .with_source_footer(true)
        .build()
        .await
        .unwrap();

    let outcome = h
        .bridge
        .ingest(IngestRequest::new("Allergic to peanuts").source(
            Some("chatgpt".to_string()),
            Some("https://chat.example/c/42".to_string()),
        ))
        .await
        .unwrap();
    assert!(matches!(outcome.action_result, ActionResult::Saved { .. }));

    let record = h.bridge.recent(1).await.unwrap().remove(0);
    assert_eq!(
        record.content,
        "Allergic to peanuts\n\n[Source: chatgpt | URL: https://chat.example/c/42]"
    );
    assert_eq!(record.source, "chatgpt");
    assert_eq!(record.source_url.as_deref(), Some("https://chat.example/c/42"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writes_of_identical_content_stay_distinct() {
    const CALLS: usize = 32;
    const CONTENT: &str = "Prefers window seats on long flights";

    let h = TestHarness::new().await.unwrap();
    let mut handles = Vec::with_capacity(CALLS);
    for i in 0..CALLS {
        let bridge = h.bridge.clone();
        handles.push(tokio::spawn(async move {
            if i % 2 == 0 {
                bridge.add_memory(AddMemory::new(CONTENT)).await
            } else {
                let outcome = bridge.ingest(IngestRequest::new(CONTENT)).await?;
                Ok(outcome
                    .action_result
                    .memory_id()
                    .expect("mock oracle answers SAVE")
                    .to_string())
            }
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap().unwrap());
    }
    assert_eq!(ids.len(), CALLS);
    assert_eq!(h.bridge.count().await.unwrap(), CALLS);
}
