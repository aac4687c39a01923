use std::path::PathBuf;
use std::sync::Arc;

use http::Method;
use mws_core::{Engine, EngineConfig, MockNetwork, NewReview, QueuedRequest, Restaurant, Review};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::commands::common::{
    filter_value, format_queue_lines, format_relative_time, format_restaurant_lines,
    format_review_lines, normalize_text, resolve_config, review_timestamp_ms, EngineOptions,
};
use crate::cli::CompletionShell;
use crate::commands::completions::run_completions;
use crate::commands::favorite::run_favorite;
use crate::commands::flush::run_flush;
use crate::commands::review::{build_review, run_review};
use crate::commands::show::run_show;
use crate::error::CliError;

fn offline_engine() -> (Arc<MockNetwork>, Engine) {
    let network = Arc::new(MockNetwork::new());
    let engine = Engine::in_memory(EngineConfig::default(), network.clone());
    engine.connectivity().set_online(false);
    (network, engine)
}

fn restaurant(value: serde_json::Value) -> Restaurant {
    serde_json::from_value(value).unwrap()
}

fn review(value: serde_json::Value) -> Review {
    serde_json::from_value(value).unwrap()
}

#[test]
fn normalize_text_trims_and_rejects_empty() {
    assert_eq!(normalize_text("  Mission  "), Some("Mission".to_string()));
    assert_eq!(normalize_text(" \n\t "), None);
}

#[test]
fn filter_value_falls_back_to_all() {
    assert_eq!(filter_value(None), "all");
    assert_eq!(filter_value(Some("   ")), "all");
    assert_eq!(filter_value(Some(" Asian ")), "Asian");
}

#[test]
fn format_relative_time_uses_compact_units() {
    let now = 10_000_000_000;
    assert_eq!(format_relative_time(now - 5_000, now), "just now");
    assert_eq!(format_relative_time(now - 5 * 60_000, now), "5m ago");
    assert_eq!(format_relative_time(now - 3 * 3_600_000, now), "3h ago");
    assert_eq!(format_relative_time(now - 2 * 86_400_000, now), "2d ago");
    assert_eq!(format_relative_time(now - 14 * 86_400_000, now), "2w ago");
    assert_eq!(format_relative_time(now - 400 * 86_400_000, now), "1y ago");
}

#[test]
fn review_timestamp_accepts_millis_and_rfc3339() {
    let millis = review(json!({"id": 1, "restaurant_id": 1, "createdAt": 1_504_095_567_183_i64}));
    assert_eq!(review_timestamp_ms(&millis), Some(1_504_095_567_183));

    let text = review(json!({
        "id": 2,
        "restaurant_id": 1,
        "createdAt": "2018-06-01T12:00:00.000Z"
    }));
    assert_eq!(review_timestamp_ms(&text), Some(1_527_854_400_000));

    let missing = review(json!({"id": 3, "restaurant_id": 1}));
    assert_eq!(review_timestamp_ms(&missing), None);
}

#[test]
fn build_review_normalizes_input() {
    let built = build_review(
        7,
        "  Ana ",
        4,
        &["Great".to_string(), "noodles".to_string()],
    )
    .unwrap();
    assert_eq!(
        built,
        NewReview {
            restaurant_id: 7,
            name: "Ana".to_string(),
            rating: 4,
            comments: "Great noodles".to_string(),
        }
    );
}

#[test]
fn build_review_rejects_blank_fields() {
    assert!(matches!(
        build_review(7, "  ", 4, &["ok".to_string()]),
        Err(CliError::EmptyReviewerName)
    ));
    assert!(matches!(
        build_review(7, "Ana", 4, &[]),
        Err(CliError::EmptyComments)
    ));
}

#[test]
fn restaurant_lines_mark_favorites() {
    let lines = format_restaurant_lines(&[
        restaurant(json!({
            "id": 1,
            "name": "Mission Chinese Food",
            "neighborhood": "Manhattan",
            "cuisine_type": "Asian",
            "is_favorite": "true"
        })),
        restaurant(json!({"id": 12, "name": "Casa Enrique", "is_favorite": false})),
    ]);
    assert_eq!(
        lines,
        vec![
            "★   1  Mission Chinese Food  (Manhattan, Asian)".to_string(),
            "   12  Casa Enrique  (?, ?)".to_string(),
        ]
    );
}

#[test]
fn review_lines_flag_pending_reviews() {
    let now = 1_000_000_000;
    let pending = review(json!({
        "id": 4,
        "restaurant_id": 7,
        "name": "Ana",
        "rating": 5,
        "comments": "Great",
        "createdAt": now - 120_000,
        "localId": 4,
        "temporaryId": "local-4"
    }));
    assert_eq!(
        format_review_lines(&[pending], now),
        vec!["5/5  Ana  2m ago [pending]\n      Great".to_string()]
    );
}

#[test]
fn queue_lines_show_method_url_and_size() {
    let record: QueuedRequest = serde_json::from_value(json!({
        "localId": 3,
        "url": "http://localhost:1337/restaurants/42?is_favorite=true",
        "method": "PUT",
        "headers": {},
        "mode": "cors",
        "cache": "default",
        "credentials": "same-origin",
        "redirect": "follow",
        "referrer": "client"
    }))
    .unwrap();
    assert_eq!(
        format_queue_lines(&[record]),
        vec!["#3  PUT http://localhost:1337/restaurants/42?is_favorite=true  (0 bytes)".to_string()]
    );
}

#[test]
fn db_path_flag_moves_mirror_and_cache() {
    let options = EngineOptions {
        db_path: Some(PathBuf::from("/tmp/mws/mirror.db")),
        ..EngineOptions::default()
    };
    let config = resolve_config(&options, |_| None).unwrap();
    assert_eq!(config.database_path, PathBuf::from("/tmp/mws/mirror.db"));
    assert_eq!(config.cache_path, PathBuf::from("/tmp/mws/mirror.cache.db"));
}

#[test]
fn api_url_flag_overrides_environment() {
    let options = EngineOptions {
        api_url: Some("https://reviews.example.com/".to_string()),
        ..EngineOptions::default()
    };
    let config = resolve_config(&options, |name| {
        (name == "MWS_API_BASE_URL").then(|| "http://ignored.example.com".to_string())
    })
    .unwrap();
    assert_eq!(config.api_base_url, "https://reviews.example.com");
}

#[test]
fn api_url_flag_requires_http_scheme() {
    let options = EngineOptions {
        api_url: Some("reviews.example.com".to_string()),
        ..EngineOptions::default()
    };
    assert!(matches!(
        resolve_config(&options, |_| None),
        Err(CliError::Config(_))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn show_reports_unknown_restaurant_offline() {
    let (_network, engine) = offline_engine();
    let result = run_show(&engine, 9, false).await;
    assert!(matches!(result, Err(CliError::RestaurantNotFound(9))));
}

#[tokio::test(flavor = "multi_thread")]
async fn offline_commands_queue_writes_until_flush() {
    let (network, engine) = offline_engine();

    run_favorite(&engine, 42, true).await.unwrap();
    let review = build_review(7, "Ana", 5, &["Great".to_string()]).unwrap();
    run_review(&engine, &review).await.unwrap();
    run_flush(&engine).await.unwrap();

    assert_eq!(engine.queue().len().await.unwrap(), 2);
    assert_eq!(network.attempts(), 0);

    network.respond_json(Method::PUT, "/restaurants/42?is_favorite=true", &json!({"id": 42}));
    network.respond_json(Method::POST, "/reviews", &json!({"id": 90, "restaurant_id": 7}));
    engine.connectivity().set_online(true);
    run_flush(&engine).await.unwrap();

    assert!(engine.queue().is_empty().await.unwrap());
    let paths: Vec<String> = network
        .delivered()
        .iter()
        .map(|request| request.url.path().to_string())
        .collect();
    assert_eq!(paths, vec!["/restaurants/42", "/reviews"]);
}

#[test]
fn completions_are_written_to_the_requested_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mws.bash");
    run_completions(CompletionShell::Bash, Some(&path)).unwrap();

    let script = std::fs::read_to_string(&path).unwrap();
    assert!(script.contains("mws"));
    assert!(script.contains("restaurants"));
}
