//! Typed helpers for the restaurant reviews API, issued through the engine.

use http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::engine::Engine;
use crate::error::Error;
use crate::models::{NewReview, Restaurant, Review};
use crate::request::{ApiRequest, ApiResponse};
use crate::util::compact_text;
use crate::Result;

/// Filter value that matches everything.
pub const ANY: &str = "all";

/// A restaurant together with its reviews.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestaurantDetails {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    pub reviews: Vec<Review>,
}

/// Restaurant client bound to an engine.
pub struct RestaurantClient<'a> {
    engine: &'a Engine,
}

impl<'a> RestaurantClient<'a> {
    pub const fn new(engine: &'a Engine) -> Self {
        Self { engine }
    }

    pub async fn restaurants(&self) -> Result<Vec<Restaurant>> {
        self.fetch("/restaurants").await
    }

    pub async fn restaurant(&self, id: i64) -> Result<Restaurant> {
        self.fetch(&format!("/restaurants/{id}")).await
    }

    /// Reviews of a restaurant; none mirrored while offline is an empty list.
    pub async fn reviews_for(&self, id: i64) -> Result<Vec<Review>> {
        match self.fetch(&format!("/reviews/?restaurant_id={id}")).await {
            Err(Error::NotFound(_)) => Ok(Vec::new()),
            other => other,
        }
    }

    pub async fn restaurant_with_reviews(&self, id: i64) -> Result<RestaurantDetails> {
        let restaurant = self.restaurant(id).await?;
        let reviews = self.reviews_for(id).await?;
        Ok(RestaurantDetails {
            restaurant,
            reviews,
        })
    }

    pub async fn by_cuisine(&self, cuisine: &str) -> Result<Vec<Restaurant>> {
        self.by_cuisine_and_neighborhood(cuisine, ANY).await
    }

    pub async fn by_neighborhood(&self, neighborhood: &str) -> Result<Vec<Restaurant>> {
        self.by_cuisine_and_neighborhood(ANY, neighborhood).await
    }

    /// Restaurants matching both filters; [`ANY`] disables a filter.
    pub async fn by_cuisine_and_neighborhood(
        &self,
        cuisine: &str,
        neighborhood: &str,
    ) -> Result<Vec<Restaurant>> {
        let restaurants = self.restaurants().await?;
        Ok(restaurants
            .into_iter()
            .filter(|r| cuisine == ANY || r.cuisine_type.as_deref() == Some(cuisine))
            .filter(|r| neighborhood == ANY || r.neighborhood.as_deref() == Some(neighborhood))
            .collect())
    }

    /// Distinct neighborhoods, in first-seen order.
    pub async fn neighborhoods(&self) -> Result<Vec<String>> {
        let restaurants = self.restaurants().await?;
        Ok(unique(restaurants.iter().filter_map(|r| r.neighborhood.clone())))
    }

    /// Distinct cuisines, in first-seen order.
    pub async fn cuisines(&self) -> Result<Vec<String>> {
        let restaurants = self.restaurants().await?;
        Ok(unique(restaurants.iter().filter_map(|r| r.cuisine_type.clone())))
    }

    pub async fn toggle_favorite(&self, id: i64, favorite: bool) -> Result<Restaurant> {
        let url = self
            .engine
            .config()
            .api_url(&format!("/restaurants/{id}?is_favorite={favorite}"));
        let response = self
            .engine
            .handle(ApiRequest::parse(Method::PUT, &url)?)
            .await?;
        decode(&response)
    }

    pub async fn submit_review(&self, review: &NewReview) -> Result<Review> {
        if !(1..=5).contains(&review.rating) {
            return Err(Error::InvalidInput(format!(
                "rating must be between 1 and 5, got {}",
                review.rating
            )));
        }
        let url = self.engine.config().api_url("/reviews");
        let request = ApiRequest::parse(Method::POST, &url)?.with_json(review)?;
        let response = self.engine.handle(request).await?;
        decode(&response)
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.engine.config().api_url(path);
        let response = self.engine.handle(ApiRequest::get(&url)?).await?;
        decode(&response)
    }
}

/// Image path for a restaurant's photograph.
pub fn image_url_for(restaurant: &Restaurant) -> String {
    restaurant.photograph.as_ref().map_or_else(
        || "/img/not-found".to_string(),
        |photograph| format!("/img/{photograph}"),
    )
}

/// Page URL for a restaurant.
pub fn url_for(restaurant: &Restaurant) -> String {
    format!("./restaurant.html?id={}", restaurant.id)
}

fn decode<T: DeserializeOwned>(response: &ApiResponse) -> Result<T> {
    if response.status == StatusCode::NOT_FOUND {
        return Err(Error::NotFound(response.text()));
    }
    if !response.is_success() {
        return Err(Error::Api {
            status: response.status.as_u16(),
            message: compact_text(&response.text()),
        });
    }
    response.json()
}

fn unique(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = Vec::new();
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}
