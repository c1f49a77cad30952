// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end scenarios for the complete tool surface.
//!
//! Each test builds an isolated harness (scripted provider, temp artifact
//! store, full toolkit) and drives the tool façade the way a protocol
//! client would, asserting on the serialized envelopes.

use chrono::{TimeZone, Utc};
use serde_json::Value;
use tokio::io::AsyncReadExt;

use telexport_core::{MediaKind, ProviderError};
use telexport_history::FetcherConfig;
use telexport_test_utils::{
    channel, corpus::with_media, sequential_messages, TestHarness,
};
use telexport_gateway::{FetchHistoryRequest, ResolveChatRequest};

const CHAT_ID: i64 = 123_456_789;

fn epoch() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
}

fn fetch_request(chat: &str) -> FetchHistoryRequest {
    FetchHistoryRequest {
        chat: chat.to_string(),
        from_date: Some("2025-06-01T00:00:00Z".into()),
        to_date: Some("2025-06-03T00:00:00Z".into()),
        page_size: Some(100),
        cursor: None,
        direction: Some(telexport_core::Direction::Asc),
        search: None,
        filter: None,
    }
}

async fn harness_with(count: usize) -> TestHarness {
    TestHarness::builder()
        .with_chat(
            channel(CHAT_ID, "example_public", "Example Public"),
            sequential_messages(1001, count, epoch(), 60),
        )
        .build()
        .await
        .unwrap()
}

fn envelope_json(envelope: &telexport_gateway::ToolResponse) -> Value {
    serde_json::to_value(envelope).unwrap()
}

// ---- Scenario 1: resolve by handle ----

#[tokio::test]
async fn resolve_by_handle_returns_canonical_descriptor() {
    let harness = harness_with(0).await;
    let envelope = harness
        .toolkit
        .resolve_chat(ResolveChatRequest {
            input: "@example_public".into(),
        })
        .await;

    let json = envelope_json(&envelope);
    assert!(json.get("isError").is_none());
    let chat = &json["structuredContent"];
    assert_eq!(chat["chat_id"], "123456789");
    assert_eq!(chat["kind"], "channel");
    assert_eq!(chat["username"], "example_public");
    assert_eq!(chat["title"], "Example Public");
    assert_eq!(json["content"][0]["type"], "text");
}

// ---- Scenario 2: resolve invalid ----

#[tokio::test]
async fn resolve_invalid_handle_is_username_invalid() {
    let harness = harness_with(0).await;
    let envelope = harness
        .toolkit
        .resolve_chat(ResolveChatRequest {
            input: "@@bad".into(),
        })
        .await;

    let json = envelope_json(&envelope);
    assert_eq!(json["isError"], true);
    assert_eq!(json["error"]["type"], "USERNAME_INVALID");
    assert_eq!(json["error"]["status"], 400);
    assert_eq!(envelope.http_status(), 400);
}

// ---- Scenarios 3 and 4: two-page traversal ----

#[tokio::test]
async fn two_page_window_paginates_cleanly() {
    let harness = harness_with(150).await;

    // First page: 100 messages, ids 1001..=1100, cursor present.
    let first = harness
        .toolkit
        .fetch_history(fetch_request("@example_public"))
        .await;
    let json = envelope_json(&first);
    assert!(json.get("isError").is_none());

    let page = &json["structuredContent"];
    let messages = page["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 100);
    assert_eq!(messages[0]["id"], 1001);
    assert_eq!(messages[99]["id"], 1100);
    assert_eq!(page["page_info"]["has_more"], true);
    assert!(page["page_info"]["cursor"].is_string());
    assert!(page.get("export").is_none());

    // Second page via cursor: the remaining 50, traversal exhausted.
    let cursor = page["page_info"]["cursor"].as_str().unwrap().to_string();
    let mut request = fetch_request("@example_public");
    request.cursor = Some(cursor);
    let second = harness.toolkit.fetch_history(request).await;
    let json = envelope_json(&second);

    let page = &json["structuredContent"];
    let messages = page["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 50);
    assert_eq!(messages[0]["id"], 1101);
    assert_eq!(messages[49]["id"], 1150);
    assert_eq!(page["page_info"]["has_more"], false);
    assert!(page["page_info"]["cursor"].is_null());
    assert_eq!(page["page_info"]["total_fetched"], 150);
}

// ---- Scenario 5: large window triggers export ----

#[tokio::test]
async fn large_window_exports_full_ndjson_artifact() {
    let harness = harness_with(1200).await;
    let mut request = fetch_request("@example_public");
    request.from_date = None;
    request.to_date = None;

    let envelope = harness.toolkit.fetch_history(request).await;
    let json = envelope_json(&envelope);
    assert!(json.get("isError").is_none());

    let page = &json["structuredContent"];
    assert_eq!(page["messages"].as_array().unwrap().len(), 100);
    assert_eq!(page["export"]["format"], "ndjson");
    let uri = page["export"]["uri"].as_str().unwrap();
    assert!(uri.starts_with("telexport://export/"));

    // The artifact holds all 1,200 messages, one JSON object per line.
    let mut reader = harness.store.read(uri).await.unwrap();
    let mut body = String::new();
    reader.read_to_string(&mut body).await.unwrap();
    assert_eq!(body.lines().count(), 1200);
    let first: Value = serde_json::from_str(body.lines().next().unwrap()).unwrap();
    assert_eq!(first["id"], 1001);
}

// ---- Scenario 6: rate limit with cursor-preserving surfacing ----

#[tokio::test]
async fn over_budget_rate_limit_surfaces_resumable_cursor() {
    let harness = TestHarness::builder()
        .with_chat(
            channel(CHAT_ID, "example_public", "Example Public"),
            sequential_messages(1001, 150, epoch(), 60),
        )
        .with_resolver_cache(16)
        .build()
        .await
        .unwrap();

    // Warm the resolver cache so the injected fault hits the history
    // fetch, not the resolution.
    harness
        .toolkit
        .resolve_chat(ResolveChatRequest {
            input: "@example_public".into(),
        })
        .await;

    harness
        .provider
        .push_fault(ProviderError::FloodWait { seconds: 120 });

    let envelope = harness
        .toolkit
        .fetch_history(fetch_request("@example_public"))
        .await;
    let json = envelope_json(&envelope);
    assert_eq!(json["isError"], true);
    assert_eq!(json["error"]["type"], "RATE_LIMITED");
    assert_eq!(json["error"]["status"], 429);
    assert_eq!(json["error"]["retry_after"], 120);
    assert_eq!(envelope.http_status(), 429);

    // Resubmitting the surfaced cursor after the wait resumes the
    // traversal over the not-yet-seen messages.
    let cursor = json["structuredContent"]["cursor"]
        .as_str()
        .unwrap()
        .to_string();
    let mut request = fetch_request("@example_public");
    request.cursor = Some(cursor);
    let resumed = harness.toolkit.fetch_history(request).await;
    let json = envelope_json(&resumed);
    assert!(json.get("isError").is_none());
    let messages = json["structuredContent"]["messages"].as_array().unwrap();
    assert_eq!(messages[0]["id"], 1001);
    assert_eq!(messages.len(), 100);
}

// ---- Scenario 7: filter reduces result ----

#[tokio::test]
async fn media_filter_returns_single_reduced_page() {
    let mut messages = sequential_messages(1001, 1000, epoch(), 60);
    for (i, m) in messages.iter_mut().enumerate() {
        if i % 25 == 0 {
            *m = with_media(m.clone(), MediaKind::Photo);
        }
    }
    let harness = TestHarness::builder()
        .with_chat(channel(CHAT_ID, "example_public", "Example Public"), messages)
        .with_fetcher_config(FetcherConfig {
            scan_budget_batches: 32,
            ..FetcherConfig::default()
        })
        .build()
        .await
        .unwrap();

    let request = FetchHistoryRequest {
        chat: "@example_public".into(),
        from_date: None,
        to_date: None,
        page_size: Some(50),
        cursor: None,
        direction: Some(telexport_core::Direction::Asc),
        search: None,
        filter: serde_json::from_value(serde_json::json!({
            "media_types": ["photo"]
        }))
        .unwrap(),
    };

    let envelope = harness.toolkit.fetch_history(request).await;
    let json = envelope_json(&envelope);
    assert!(json.get("isError").is_none());

    let page = &json["structuredContent"];
    let messages = page["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 40);
    assert!(messages
        .iter()
        .all(|m| m["media_type"] == "photo"));
    assert_eq!(page["page_info"]["has_more"], false);
}

// ---- Envelope-level validation behaviors ----

#[tokio::test]
async fn oversized_page_size_is_validation_error() {
    let harness = harness_with(10).await;
    let mut request = fetch_request("@example_public");
    request.page_size = Some(101);

    let envelope = harness.toolkit.fetch_history(request).await;
    let json = envelope_json(&envelope);
    assert_eq!(json["isError"], true);
    assert_eq!(json["error"]["type"], "VALIDATION_ERROR");
    assert_eq!(json["error"]["status"], 400);
}

#[tokio::test]
async fn non_utc_offset_is_validation_error() {
    let harness = harness_with(10).await;
    let mut request = fetch_request("@example_public");
    request.from_date = Some("2025-06-01T00:00:00+03:00".into());

    let envelope = harness.toolkit.fetch_history(request).await;
    let json = envelope_json(&envelope);
    assert_eq!(json["isError"], true);
    assert_eq!(json["error"]["type"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn inverted_window_is_validation_error() {
    let harness = harness_with(10).await;
    let mut request = fetch_request("@example_public");
    request.from_date = Some("2025-06-03T00:00:00Z".into());
    request.to_date = Some("2025-06-01T00:00:00Z".into());

    let envelope = harness.toolkit.fetch_history(request).await;
    let json = envelope_json(&envelope);
    assert_eq!(json["isError"], true);
    assert_eq!(json["error"]["type"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn unknown_chat_is_chat_not_found() {
    let harness = harness_with(10).await;
    let envelope = harness
        .toolkit
        .fetch_history(fetch_request("@missing_channel"))
        .await;
    let json = envelope_json(&envelope);
    assert_eq!(json["isError"], true);
    assert_eq!(json["error"]["type"], "CHAT_NOT_FOUND");
    assert_eq!(json["error"]["status"], 404);
}

#[tokio::test]
async fn expired_artifact_read_is_resource_expired() {
    let harness = harness_with(0).await;
    let err = harness
        .store
        .read("telexport://export/export-0123456789abcdef.ndjson")
        .await
        .unwrap_err();
    assert_eq!(err.kind().as_str(), "RESOURCE_EXPIRED");
    assert_eq!(err.kind().status(), 404);
}
