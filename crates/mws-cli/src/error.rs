use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] mws_core::Error),
    #[error(transparent)]
    Config(#[from] mws_core::ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Review comments cannot be empty")]
    EmptyComments,
    #[error("Reviewer name cannot be empty")]
    EmptyReviewerName,
    #[error("Restaurant {0} not found (offline and not mirrored?)")]
    RestaurantNotFound(i64),
}
