//! Replay of queued writes once the network is back.

mod reconcile;

pub(crate) use reconcile::store_confirmed;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::Error;
use crate::models::Review;
use crate::network::Network;
use crate::queue::PendingWriteQueue;
use crate::router::Route;
use crate::serializer;
use crate::services::StorageService;
use crate::Result;

/// Outcome of a [`SyncCoordinator::flush`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    /// Records confirmed by the server during this flush
    pub replayed: usize,
    /// Records still queued when the flush finished
    pub remaining: u64,
    /// The flush joined one already in flight instead of running
    pub coalesced: bool,
}

impl FlushReport {
    const fn coalesced() -> Self {
        Self {
            replayed: 0,
            remaining: 0,
            coalesced: true,
        }
    }
}

/// Drains the pending write queue against the network, one record at a time.
pub struct SyncCoordinator {
    queue: Arc<PendingWriteQueue>,
    storage: StorageService,
    network: Arc<dyn Network>,
    gate: Mutex<()>,
    recheck: AtomicBool,
}

impl SyncCoordinator {
    pub fn new(
        queue: Arc<PendingWriteQueue>,
        storage: StorageService,
        network: Arc<dyn Network>,
    ) -> Self {
        Self {
            queue,
            storage,
            network,
            gate: Mutex::new(()),
            recheck: AtomicBool::new(false),
        }
    }

    /// Replay every queued record in `localId` order.
    ///
    /// Only one flush runs at a time. A call made while another is in flight
    /// returns a coalesced report immediately, and the running flush drains
    /// the queue once more before it finishes. A failed replay aborts with
    /// [`Error::Replay`]; records confirmed before it stay removed and the rest
    /// stay queued in order.
    pub async fn flush(&self) -> Result<FlushReport> {
        self.recheck.store(true, Ordering::SeqCst);
        let mut replayed = 0;

        loop {
            let Ok(guard) = self.gate.try_lock() else {
                tracing::debug!("Flush already in flight, coalescing");
                return Ok(FlushReport::coalesced());
            };

            while self.recheck.swap(false, Ordering::SeqCst) {
                replayed += self.drain_once().await?;
            }
            drop(guard);

            if !self.recheck.load(Ordering::SeqCst) {
                break;
            }
        }

        let remaining = self.queue.len().await?;
        if replayed > 0 {
            tracing::info!(replayed, remaining, "Flushed queued writes");
        }
        Ok(FlushReport {
            replayed,
            remaining,
            coalesced: false,
        })
    }

    async fn drain_once(&self) -> Result<usize> {
        let records = self.queue.drain_in_order().await?;
        let mut replayed = 0;

        for record in records {
            let request = serializer::deserialize(&record)?;
            let route = Route::classify(&request.method, &request.url);

            let response = match self.network.send(request).await {
                Ok(response) => response,
                Err(Error::NetworkUnavailable(reason)) => {
                    tracing::warn!(local_id = record.local_id, "Replay failed: {reason}");
                    return Err(Error::Replay {
                        local_id: record.local_id,
                        reason,
                    });
                }
                Err(error) => return Err(error),
            };

            if !response.is_success() {
                tracing::warn!(
                    local_id = record.local_id,
                    status = %response.status,
                    "Replay rejected by server"
                );
                return Err(Error::Replay {
                    local_id: record.local_id,
                    reason: format!("server answered {}", response.status),
                });
            }

            self.queue.remove(record.local_id).await?;
            store_confirmed(&self.storage, route, &response).await?;
            if route == Route::CreateReview {
                self.storage
                    .delete_by_index::<Review>(Review::TEMP_INDEX, record.local_id)
                    .await?;
            }
            replayed += 1;
        }

        Ok(replayed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CURRENT_VERSION;
    use crate::models::Restaurant;
    use crate::network::MockNetwork;
    use crate::request::ApiRequest;
    use http::{Method, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct Fixture {
        storage: StorageService,
        queue: Arc<PendingWriteQueue>,
        network: Arc<MockNetwork>,
        coordinator: Arc<SyncCoordinator>,
    }

    fn fixture() -> Fixture {
        let storage = StorageService::in_memory(CURRENT_VERSION);
        let queue = Arc::new(PendingWriteQueue::new(storage.clone()));
        let network = Arc::new(MockNetwork::new());
        let coordinator = Arc::new(SyncCoordinator::new(
            Arc::clone(&queue),
            storage.clone(),
            network.clone(),
        ));
        Fixture {
            storage,
            queue,
            network,
            coordinator,
        }
    }

    fn favorite(id: i64) -> ApiRequest {
        ApiRequest::parse(
            Method::PUT,
            &format!("http://localhost:1337/restaurants/{id}?is_favorite=true"),
        )
        .unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn empty_queue_is_trivial_success() {
        let fx = fixture();
        let report = fx.coordinator.flush().await.unwrap();
        assert_eq!(report, FlushReport::default());
        assert_eq!(fx.network.attempts(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn replays_in_order_and_empties_queue() {
        let fx = fixture();
        for id in 1..=3 {
            fx.network.respond_json(
                Method::PUT,
                &format!("/restaurants/{id}?is_favorite=true"),
                &json!({"id": id, "name": format!("R{id}"), "is_favorite": "true"}),
            );
            fx.queue.enqueue(favorite(id)).await.unwrap();
        }

        let report = fx.coordinator.flush().await.unwrap();
        assert_eq!(report.replayed, 3);
        assert_eq!(report.remaining, 0);

        let paths = fx
            .network
            .delivered()
            .iter()
            .map(|request| request.url.path().to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            paths,
            vec!["/restaurants/1", "/restaurants/2", "/restaurants/3"]
        );

        let stored: Option<Restaurant> = fx.storage.get(2_i64).await.unwrap();
        assert_eq!(stored.and_then(|r| r.name).as_deref(), Some("R2"));

        // idempotent
        let again = fx.coordinator.flush().await.unwrap();
        assert_eq!(again.replayed, 0);
        assert_eq!(fx.network.delivered().len(), 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failure_keeps_the_rest_queued_in_order() {
        let fx = fixture();
        let mut ids = Vec::new();
        for id in 1..=4 {
            fx.network.respond_json(
                Method::PUT,
                &format!("/restaurants/{id}?is_favorite=true"),
                &json!({"id": id}),
            );
            ids.push(fx.queue.enqueue(favorite(id)).await.unwrap());
        }
        fx.network.fail(Method::PUT, "/restaurants/3?is_favorite=true");

        let err = fx.coordinator.flush().await.unwrap_err();
        assert!(matches!(err, Error::Replay { local_id, .. } if local_id == ids[2]));

        let remaining = fx
            .queue
            .drain_in_order()
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.local_id)
            .collect::<Vec<_>>();
        assert_eq!(remaining, ids[2..].to_vec());

        fx.network.heal(Method::PUT, "/restaurants/3?is_favorite=true");
        let report = fx.coordinator.flush().await.unwrap();
        assert_eq!(report.replayed, 2);

        let paths = fx
            .network
            .delivered()
            .iter()
            .map(|request| request.url.path().to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            paths,
            vec![
                "/restaurants/1",
                "/restaurants/2",
                "/restaurants/3",
                "/restaurants/4"
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn non_success_status_is_a_replay_failure() {
        let fx = fixture();
        fx.network.respond(
            Method::PUT,
            "/restaurants/1?is_favorite=true",
            StatusCode::INTERNAL_SERVER_ERROR,
            "{}",
        );
        let local_id = fx.queue.enqueue(favorite(1)).await.unwrap();

        let err = fx.coordinator.flush().await.unwrap_err();
        assert!(matches!(err, Error::Replay { local_id: failed, .. } if failed == local_id));
        assert_eq!(fx.queue.len().await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn confirmed_review_replaces_temporary_one() {
        let fx = fixture();
        let body = json!({"restaurant_id": 5, "name": "A", "rating": 4, "comments": "ok"});
        let request = ApiRequest::parse(Method::POST, "http://localhost:1337/reviews")
            .unwrap()
            .with_json(&body)
            .unwrap();
        let local_id = fx.queue.enqueue(request).await.unwrap();

        let temporary =
            Review::temporary(local_id, body.to_string().as_bytes(), 1_000).unwrap();
        fx.storage.put(&temporary).await.unwrap();

        fx.network.respond_json(
            Method::POST,
            "/reviews",
            &json!({"id": 77, "restaurant_id": 5, "name": "A", "rating": 4, "comments": "ok"}),
        );
        fx.coordinator.flush().await.unwrap();

        let reviews: Vec<Review> = fx
            .storage
            .get_all_by_index(Review::RESTAURANT_INDEX, 5)
            .await
            .unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].id, 77);
        assert!(!reviews[0].is_temporary());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_flushes_replay_each_record_once() {
        let fx = fixture();
        for id in 1..=5 {
            fx.network.respond_json(
                Method::PUT,
                &format!("/restaurants/{id}?is_favorite=true"),
                &json!({"id": id}),
            );
            fx.queue.enqueue(favorite(id)).await.unwrap();
        }

        let tasks = (0..4)
            .map(|_| {
                let coordinator = Arc::clone(&fx.coordinator);
                tokio::spawn(async move { coordinator.flush().await.unwrap() })
            })
            .collect::<Vec<_>>();
        let mut replayed = 0;
        for task in tasks {
            replayed += task.await.unwrap().replayed;
        }

        assert_eq!(replayed, 5);
        assert_eq!(fx.network.delivered().len(), 5);
        assert!(fx.queue.is_empty().await.unwrap());
    }
}
