//! Durable record of a write that could not reach the network

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::db::{Record, StoreKey};
use crate::request::RequestMeta;

/// A queued mutation, replayable in ascending `local_id` order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedRequest {
    /// Ordering key assigned at enqueue time (0 until enqueued)
    #[serde(rename = "localId")]
    pub local_id: i64,
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    /// Present only for methods that carry a body
    #[serde(default, with = "body_base64", skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<u8>>,
    #[serde(flatten)]
    pub meta: RequestMeta,
}

impl Record for QueuedRequest {
    const STORE: &'static str = "requests";

    fn key(&self) -> StoreKey {
        StoreKey::Int(self.local_id)
    }
}

mod body_base64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(body: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match body {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|encoded| STANDARD.decode(encoded).map_err(serde::de::Error::custom))
            .transpose()
    }
}
