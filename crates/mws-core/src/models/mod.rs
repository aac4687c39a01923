//! Data models for mws

mod queued_request;
mod restaurant;
mod review;

pub use queued_request::QueuedRequest;
pub use restaurant::{LatLng, Restaurant};
pub use review::{NewReview, Review};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize an integer the API may send either as a number or a numeric string.
fn de_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(number) => number
            .as_i64()
            .ok_or_else(|| serde::de::Error::custom(format!("{number} is not an integer"))),
        Value::String(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("'{text}' is not an integer"))),
        other => Err(serde::de::Error::custom(format!(
            "expected an integer, found {other}"
        ))),
    }
}

/// Deserialize optional text that the API occasionally sends as a number.
fn de_opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}
