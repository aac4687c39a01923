//! Network layer abstraction.
//!
//! The engine never talks to reqwest directly: everything goes through
//! [`Network`], so tests can script the remote API and switch it off.

mod mock;
mod remote;

pub use mock::MockNetwork;
pub use remote::HttpNetwork;

use async_trait::async_trait;

use crate::request::{ApiRequest, ApiResponse};
use crate::Result;

/// Sends requests to the remote data API.
///
/// Implementations return `Error::NetworkUnavailable` when the request could
/// not be delivered. Any HTTP answer, whatever its status, is `Ok`.
#[async_trait]
pub trait Network: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}
