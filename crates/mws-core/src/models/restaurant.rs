//! Restaurant model

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{de_int, de_opt_text};
use crate::db::{Record, StoreKey};

/// Geographic position of a restaurant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// A restaurant as served by the API
///
/// Fields the engine does not interpret are kept in `extra` so a mirrored
/// record serializes back to what the server sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    #[serde(deserialize_with = "de_int")]
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    #[serde(
        default,
        deserialize_with = "de_opt_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub photograph: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latlng: Option<LatLng>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine_type: Option<String>,
    /// Boolean or `"true"`/`"false"`, kept as received
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Restaurant {
    /// Minimal placeholder used when a favorite is toggled for a restaurant
    /// that was never mirrored.
    pub fn placeholder(id: i64) -> Self {
        Self {
            id,
            name: None,
            neighborhood: None,
            photograph: None,
            address: None,
            latlng: None,
            cuisine_type: None,
            is_favorite: None,
            extra: Map::new(),
        }
    }

    /// Interpret the favorite flag regardless of how the server encoded it
    pub fn is_favorite(&self) -> bool {
        match &self.is_favorite {
            Some(Value::Bool(flag)) => *flag,
            Some(Value::String(text)) => text.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Optimistic patch applied while the toggle is queued; uses the same
    /// string encoding as the `is_favorite` query parameter.
    pub fn set_favorite(&mut self, favorite: bool) {
        self.is_favorite = Some(Value::String(favorite.to_string()));
    }
}

impl Record for Restaurant {
    const STORE: &'static str = "restaurants";

    fn key(&self) -> StoreKey {
        StoreKey::Int(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_unknown_fields_survive_roundtrip() {
        let payload = json!({
            "id": 1,
            "name": "Mission Chinese Food",
            "neighborhood": "Manhattan",
            "photograph": "1",
            "address": "171 E Broadway, New York, NY 10002",
            "latlng": {"lat": 40.713829, "lng": -73.989667},
            "cuisine_type": "Asian",
            "operating_hours": {"Monday": "5:30 pm - 11:00 pm"},
            "createdAt": 1_504_095_567_183_i64,
            "is_favorite": false
        });

        let restaurant: Restaurant = serde_json::from_value(payload.clone()).unwrap();
        assert!(restaurant.extra.contains_key("operating_hours"));
        assert_eq!(serde_json::to_value(&restaurant).unwrap(), payload);
    }

    #[test]
    fn test_is_favorite_accepts_bool_and_string() {
        let mut restaurant = Restaurant::placeholder(3);
        assert!(!restaurant.is_favorite());

        restaurant.is_favorite = Some(Value::Bool(true));
        assert!(restaurant.is_favorite());

        restaurant.set_favorite(false);
        assert_eq!(restaurant.is_favorite, Some(json!("false")));
        assert!(!restaurant.is_favorite());

        restaurant.set_favorite(true);
        assert_eq!(restaurant.is_favorite, Some(json!("true")));
        assert!(restaurant.is_favorite());
    }

    #[test]
    fn test_numeric_photograph_is_accepted() {
        let restaurant: Restaurant =
            serde_json::from_value(json!({"id": "10", "photograph": 10})).unwrap();
        assert_eq!(restaurant.id, 10);
        assert_eq!(restaurant.photograph.as_deref(), Some("10"));
    }
}
