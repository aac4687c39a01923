//! Review model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::de_int;
use crate::db::{IndexDef, Record, StoreKey};
use crate::error::{Error, Result};

/// A review, either confirmed by the server or synthesized while offline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Server id, or the queue `localId` standing in for it until confirmed
    #[serde(deserialize_with = "de_int")]
    pub id: i64,
    #[serde(deserialize_with = "de_int")]
    pub restaurant_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Value>,
    #[serde(rename = "temporaryId", default, skip_serializing_if = "Option::is_none")]
    pub temporary_id: Option<String>,
    #[serde(rename = "localId", default, skip_serializing_if = "Option::is_none")]
    pub local_id: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Review {
    /// Index over `restaurant_id`
    pub const RESTAURANT_INDEX: &'static str = "restaurantId";
    /// Index over `localId`, populated only for temporary reviews
    pub const TEMP_INDEX: &'static str = "temp";

    /// Synthesize a temporary review from the body of a queued `POST /reviews`.
    ///
    /// The body must be a JSON object carrying `restaurant_id`.
    pub fn temporary(local_id: i64, body: &[u8], now_ms: i64) -> Result<Self> {
        let mut fields = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => {
                return Err(Error::InvalidInput(
                    "review body must be a JSON object".to_string(),
                ))
            }
            Err(e) => return Err(Error::InvalidInput(format!("review body is not JSON: {e}"))),
        };

        fields.insert("id".to_string(), Value::from(local_id));
        fields.insert("localId".to_string(), Value::from(local_id));
        fields.insert(
            "temporaryId".to_string(),
            Value::String(Self::temporary_key(local_id)),
        );
        fields.insert("createdAt".to_string(), Value::from(now_ms));
        fields.insert("updatedAt".to_string(), Value::from(now_ms));

        serde_json::from_value(Value::Object(fields))
            .map_err(|e| Error::InvalidInput(format!("invalid review: {e}")))
    }

    /// Store key used for a temporary review created by queue entry `local_id`
    pub fn temporary_key(local_id: i64) -> String {
        format!("local-{local_id}")
    }

    /// Whether this review is awaiting server confirmation
    pub const fn is_temporary(&self) -> bool {
        self.local_id.is_some()
    }
}

impl Record for Review {
    const STORE: &'static str = "reviews";
    const INDEXES: &'static [IndexDef] = &[
        IndexDef {
            name: Self::RESTAURANT_INDEX,
            column: "restaurant_id",
        },
        IndexDef {
            name: Self::TEMP_INDEX,
            column: "local_id",
        },
    ];

    fn key(&self) -> StoreKey {
        self.temporary_id
            .as_ref()
            .map_or(StoreKey::Int(self.id), |key| StoreKey::Text(key.clone()))
    }

    fn index_value(&self, index: &str) -> Option<i64> {
        match index {
            Self::RESTAURANT_INDEX => Some(self.restaurant_id),
            Self::TEMP_INDEX => self.local_id,
            _ => None,
        }
    }
}

/// A review to submit, as the review form sends it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub restaurant_id: i64,
    pub name: String,
    pub rating: u8,
    pub comments: String,
}
