//! mws-core - Offline-first sync engine for the restaurant reviews API
//!
//! Every request goes through [`Engine::handle`]. Reads are served from the
//! network and mirrored locally; when the network is gone they are answered
//! from the mirror. Writes that cannot be delivered are queued durably and
//! replayed in order once connectivity returns.

pub mod cache;
pub mod client;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod network;
pub mod queue;
pub mod request;
pub mod router;
pub mod serializer;
pub mod services;
pub mod state;
pub mod sync;
pub mod util;

pub use client::{RestaurantClient, RestaurantDetails};
pub use config::{ConfigError, EngineConfig};
pub use engine::Engine;
pub use error::{Error, Result};
pub use lifecycle::{ControlMessage, LifecycleState};
pub use models::{NewReview, QueuedRequest, Restaurant, Review};
pub use network::{HttpNetwork, MockNetwork, Network};
pub use request::{ApiRequest, ApiResponse};
pub use sync::FlushReport;
