//! Persisting server-confirmed entities into the local mirror.

use serde::de::DeserializeOwned;

use crate::models::{Restaurant, Review};
use crate::request::ApiResponse;
use crate::router::Route;
use crate::services::StorageService;
use crate::Result;

/// Store the entities carried by a successful response for `route`.
///
/// A body that does not parse as the expected entity is logged and skipped;
/// storage failures propagate.
pub(crate) async fn store_confirmed(
    storage: &StorageService,
    route: Route,
    response: &ApiResponse,
) -> Result<usize> {
    match route {
        Route::Restaurants => store_all::<Restaurant>(storage, response).await,
        Route::Reviews(_) => store_all::<Review>(storage, response).await,
        Route::Restaurant(_) | Route::FavoriteToggle { .. } => {
            store_one::<Restaurant>(storage, response).await
        }
        Route::CreateReview => store_one::<Review>(storage, response).await,
        Route::Image | Route::PassThrough => Ok(0),
    }
}

async fn store_one<R: crate::db::Record>(
    storage: &StorageService,
    response: &ApiResponse,
) -> Result<usize> {
    let Some(record) = parse::<R>(response) else {
        return Ok(0);
    };
    storage.put(&record).await?;
    Ok(1)
}

async fn store_all<R: crate::db::Record>(
    storage: &StorageService,
    response: &ApiResponse,
) -> Result<usize> {
    let Some(records) = parse::<Vec<R>>(response) else {
        return Ok(0);
    };
    for record in &records {
        storage.put(record).await?;
    }
    Ok(records.len())
}

fn parse<T: DeserializeOwned>(response: &ApiResponse) -> Option<T> {
    response
        .json::<T>()
        .inspect_err(|error| {
            tracing::warn!("Response not mirrored, unexpected body: {error}");
        })
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CURRENT_VERSION;
    use http::StatusCode;
    use serde_json::json;

    #[tokio::test(flavor = "multi_thread")]
    async fn stores_collections_and_single_entities() {
        let storage = StorageService::in_memory(CURRENT_VERSION);
        let list = ApiResponse::new(
            StatusCode::OK,
            json!([{"id": 1, "name": "A"}, {"id": 2, "name": "B"}]).to_string(),
        );
        assert_eq!(
            store_confirmed(&storage, Route::Restaurants, &list).await.unwrap(),
            2
        );

        let one = ApiResponse::new(StatusCode::OK, json!({"id": 2, "name": "B2"}).to_string());
        assert_eq!(
            store_confirmed(&storage, Route::Restaurant(2), &one).await.unwrap(),
            1
        );
        let stored: Option<Restaurant> = storage.get(2_i64).await.unwrap();
        assert_eq!(stored.and_then(|r| r.name).as_deref(), Some("B2"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unexpected_bodies_are_skipped() {
        let storage = StorageService::in_memory(CURRENT_VERSION);
        let html = ApiResponse::new(StatusCode::OK, "<html></html>");
        assert_eq!(
            store_confirmed(&storage, Route::Restaurants, &html).await.unwrap(),
            0
        );
        assert_eq!(storage.count::<Restaurant>().await.unwrap(), 0);
    }
}
