//! Request routing: network first, local mirror and write queue as fallback.

mod route;

pub use route::Route;

use std::sync::Arc;

use crate::cache::{ResponseCache, IMAGE_CACHE};
use crate::error::Error;
use crate::models::{Restaurant, Review};
use crate::network::Network;
use crate::queue::PendingWriteQueue;
use crate::request::{ApiRequest, ApiResponse};
use crate::services::StorageService;
use crate::state::Connectivity;
use crate::sync::{store_confirmed, SyncCoordinator};
use crate::util::unix_timestamp_millis;
use crate::Result;

/// Dispatches every request the engine intercepts.
pub struct RequestRouter {
    storage: StorageService,
    queue: Arc<PendingWriteQueue>,
    coordinator: Arc<SyncCoordinator>,
    network: Arc<dyn Network>,
    cache: ResponseCache,
    connectivity: Connectivity,
}

impl RequestRouter {
    pub fn new(
        storage: StorageService,
        queue: Arc<PendingWriteQueue>,
        coordinator: Arc<SyncCoordinator>,
        network: Arc<dyn Network>,
        cache: ResponseCache,
        connectivity: Connectivity,
    ) -> Self {
        Self {
            storage,
            queue,
            coordinator,
            network,
            cache,
            connectivity,
        }
    }

    /// Answer `request`, from the network when possible.
    pub async fn handle(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.flush_opportunistically().await;

        let route = Route::classify(&request.method, &request.url);
        tracing::debug!(?route, method = %request.method, url = %request.url, "Routing request");

        match route {
            Route::Restaurants | Route::Restaurant(_) | Route::Reviews(_) => {
                self.read(route, request).await
            }
            Route::FavoriteToggle { id, favorite } => {
                self.toggle_favorite(route, request, id, favorite).await
            }
            Route::CreateReview => self.create_review(route, request).await,
            Route::Image => self.image(request).await,
            Route::PassThrough => self.send(request).await,
        }
    }

    async fn flush_opportunistically(&self) {
        if !self.connectivity.is_online() {
            return;
        }
        match self.queue.is_empty().await {
            Ok(true) => {}
            Ok(false) => {
                if let Err(error) = self.coordinator.flush().await {
                    tracing::warn!("Opportunistic flush failed: {error}");
                }
            }
            Err(error) => tracing::warn!("Could not inspect write queue: {error}"),
        }
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        if !self.connectivity.is_online() {
            return Err(Error::NetworkUnavailable("engine is offline".to_string()));
        }
        self.network.send(request).await
    }

    async fn read(&self, route: Route, request: ApiRequest) -> Result<ApiResponse> {
        let url = request.url.to_string();
        match self.send(request).await {
            Ok(response) => {
                if response.is_success() {
                    store_confirmed(&self.storage, route, &response).await?;
                }
                Ok(response)
            }
            Err(Error::NetworkUnavailable(reason)) => {
                tracing::warn!(%url, "Network unavailable, serving mirror: {reason}");
                self.read_mirror(route, &url).await
            }
            Err(error) => Err(error),
        }
    }

    async fn read_mirror(&self, route: Route, url: &str) -> Result<ApiResponse> {
        match route {
            Route::Restaurant(id) => match self.storage.get::<Restaurant>(id).await? {
                Some(restaurant) => ApiResponse::offline_json(&restaurant),
                None => Err(Error::NotFound(format!("restaurant {id} is not mirrored"))),
            },
            Route::Restaurants => {
                let restaurants = self.storage.get_all::<Restaurant>().await?;
                if restaurants.is_empty() {
                    return Err(Error::NotFound("no restaurants mirrored".to_string()));
                }
                ApiResponse::offline_json(&restaurants)
            }
            Route::Reviews(restaurant_id) => {
                let reviews = self
                    .storage
                    .get_all_by_index::<Review>(Review::RESTAURANT_INDEX, restaurant_id)
                    .await?;
                if reviews.is_empty() {
                    return Err(Error::NotFound(format!(
                        "no reviews mirrored for restaurant {restaurant_id}"
                    )));
                }
                ApiResponse::offline_json(&reviews)
            }
            _ => Err(Error::NotFound(url.to_string())),
        }
    }

    async fn toggle_favorite(
        &self,
        route: Route,
        request: ApiRequest,
        id: i64,
        favorite: bool,
    ) -> Result<ApiResponse> {
        match self.send(request.clone()).await {
            Ok(response) => {
                if response.is_success() {
                    store_confirmed(&self.storage, route, &response).await?;
                }
                Ok(response)
            }
            Err(Error::NetworkUnavailable(reason)) => {
                tracing::warn!(id, favorite, "Queueing favorite toggle: {reason}");
                self.queue.enqueue(request).await?;

                let mut restaurant = self
                    .storage
                    .get::<Restaurant>(id)
                    .await?
                    .unwrap_or_else(|| Restaurant::placeholder(id));
                restaurant.set_favorite(favorite);
                self.storage.put(&restaurant).await?;
                ApiResponse::offline_json(&restaurant)
            }
            Err(error) => Err(error),
        }
    }

    async fn create_review(&self, route: Route, request: ApiRequest) -> Result<ApiResponse> {
        match self.send(request.clone()).await {
            Ok(response) => {
                if response.is_success() {
                    store_confirmed(&self.storage, route, &response).await?;
                }
                Ok(response)
            }
            Err(Error::NetworkUnavailable(reason)) => {
                let body = request.body.clone().unwrap_or_default();
                // malformed bodies are rejected before anything is queued
                Review::temporary(0, &body, 0)?;

                tracing::warn!("Queueing review: {reason}");
                let local_id = self.queue.enqueue(request).await?;
                let review = Review::temporary(local_id, &body, unix_timestamp_millis())?;
                self.storage.put(&review).await?;
                ApiResponse::offline_json(&review)
            }
            Err(error) => Err(error),
        }
    }

    async fn image(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = request.url.to_string();
        if let Some(cached) = self.cache.match_url(IMAGE_CACHE, &url).await? {
            return Ok(cached);
        }

        let response = self.send(request).await?;
        if response.is_success() {
            self.cache.put(IMAGE_CACHE, &url, &response).await?;
        }
        Ok(response)
    }
}
