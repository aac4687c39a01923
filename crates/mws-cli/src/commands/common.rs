use std::path::PathBuf;
use std::sync::Arc;

use chrono::DateTime;
use mws_core::client::ANY;
use mws_core::util::{is_http_url, non_empty_trimmed};
use mws_core::{Engine, EngineConfig, HttpNetwork, QueuedRequest, Restaurant, Review};
use serde_json::Value;

use crate::error::CliError;

/// Global flags that shape how the engine is opened.
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    pub db_path: Option<PathBuf>,
    pub api_url: Option<String>,
    pub offline: bool,
}

pub fn resolve_config(
    options: &EngineOptions,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<EngineConfig, CliError> {
    let mut config = EngineConfig::from_lookup(lookup)?;
    if let Some(path) = &options.db_path {
        config = config.with_database_path(path);
        config.cache_path = path.with_extension("cache.db");
    }
    if let Some(url) = &options.api_url {
        let url = url.trim();
        if !is_http_url(url) {
            return Err(mws_core::ConfigError::Invalid(
                "--api-url must start with http:// or https://".to_string(),
            )
            .into());
        }
        config = config.with_api_base_url(url);
    }
    Ok(config)
}

pub fn open_engine(options: &EngineOptions) -> Result<Engine, CliError> {
    let config = resolve_config(options, |name| std::env::var(name).ok())?;
    let network = HttpNetwork::new(config.request_timeout)?;
    let engine = Engine::new(config, Arc::new(network));
    if options.offline {
        engine.connectivity().set_online(false);
    }
    Ok(engine)
}

/// `None` disables a filter.
pub fn filter_value(value: Option<&str>) -> String {
    value
        .and_then(normalize_text)
        .unwrap_or_else(|| ANY.to_string())
}

pub fn normalize_text(value: &str) -> Option<String> {
    non_empty_trimmed(value)
}

pub fn format_restaurant_lines(restaurants: &[Restaurant]) -> Vec<String> {
    restaurants
        .iter()
        .map(|restaurant| {
            let marker = if restaurant.is_favorite() { "★" } else { " " };
            format!(
                "{marker} {:>3}  {}  ({}, {})",
                restaurant.id,
                restaurant.name.as_deref().unwrap_or("(unnamed)"),
                restaurant.neighborhood.as_deref().unwrap_or("?"),
                restaurant.cuisine_type.as_deref().unwrap_or("?"),
            )
        })
        .collect()
}

pub fn format_review_lines(reviews: &[Review], now_ms: i64) -> Vec<String> {
    reviews
        .iter()
        .map(|review| {
            let when = review_timestamp_ms(review)
                .map_or_else(String::new, |ms| format_relative_time(ms, now_ms));
            let pending = if review.is_temporary() { " [pending]" } else { "" };
            format!(
                "{}/5  {}  {when}{pending}\n      {}",
                rating_value(review.rating.as_ref()),
                review.name.as_deref().unwrap_or("Anonymous"),
                review.comments.as_deref().unwrap_or(""),
            )
        })
        .collect()
}

pub fn format_queue_lines(records: &[QueuedRequest]) -> Vec<String> {
    records
        .iter()
        .map(|record| {
            let size = record.body.as_ref().map_or(0, Vec::len);
            format!(
                "#{}  {} {}  ({size} bytes)",
                record.local_id, record.method, record.url
            )
        })
        .collect()
}

/// `createdAt` as milliseconds; the API sends either epoch millis or RFC 3339.
pub fn review_timestamp_ms(review: &Review) -> Option<i64> {
    match review.created_at.as_ref()? {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|date| date.timestamp_millis()),
        _ => None,
    }
}

fn rating_value(rating: Option<&Value>) -> String {
    match rating {
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::String(text)) => text.clone(),
        _ => "?".to_string(),
    }
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}
