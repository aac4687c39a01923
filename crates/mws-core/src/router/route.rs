//! Request classification.

use http::Method;
use url::Url;

/// What the engine does with a request, decided from method, path and query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `GET /restaurants`
    Restaurants,
    /// `GET /restaurants/{id}`
    Restaurant(i64),
    /// `PUT /restaurants/{id}?is_favorite={bool}`
    FavoriteToggle { id: i64, favorite: bool },
    /// `GET /reviews?restaurant_id={id}`
    Reviews(i64),
    /// `POST /reviews`
    CreateReview,
    /// `GET /img/*`
    Image,
    /// Forwarded untouched
    PassThrough,
}

impl Route {
    pub fn classify(method: &Method, url: &Url) -> Self {
        let segments = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect::<Vec<_>>())
            .unwrap_or_default();

        match (method, segments.as_slice()) {
            (&Method::GET, ["restaurants"]) => Self::Restaurants,
            (&Method::GET, ["restaurants", id]) => {
                id.parse().map_or(Self::PassThrough, Self::Restaurant)
            }
            (&Method::PUT, ["restaurants", id]) => {
                match (id.parse(), query_param(url, "is_favorite").as_deref()) {
                    (Ok(id), Some("true")) => Self::FavoriteToggle { id, favorite: true },
                    (Ok(id), Some("false")) => Self::FavoriteToggle { id, favorite: false },
                    _ => Self::PassThrough,
                }
            }
            (&Method::GET, ["reviews"]) => query_param(url, "restaurant_id")
                .and_then(|id| id.trim().parse().ok())
                .map_or(Self::PassThrough, Self::Reviews),
            (&Method::POST, ["reviews"]) => Self::CreateReview,
            (&Method::GET, ["img", _, ..]) => Self::Image,
            _ => Self::PassThrough,
        }
    }
}

fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
