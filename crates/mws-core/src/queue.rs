//! Durable FIFO of writes that could not reach the network.

use tokio::sync::Mutex;

use crate::models::QueuedRequest;
use crate::request::ApiRequest;
use crate::serializer;
use crate::services::StorageService;
use crate::Result;

/// Pending write queue on top of the `requests` object store.
///
/// `localId`s come from a counter seeded with the highest persisted id the
/// first time the queue is used, so ids stay strictly increasing across
/// restarts and within bursts of writes.
pub struct PendingWriteQueue {
    storage: StorageService,
    last_id: Mutex<Option<i64>>,
}

impl PendingWriteQueue {
    pub fn new(storage: StorageService) -> Self {
        Self {
            storage,
            last_id: Mutex::new(None),
        }
    }

    /// Serialize and persist `request`, returning its `localId` once stored.
    pub async fn enqueue(&self, request: ApiRequest) -> Result<i64> {
        let mut last_id = self.last_id.lock().await;
        let seed = match *last_id {
            Some(id) => id,
            None => self.persisted_max().await?,
        };

        let mut record = serializer::serialize(request);
        record.local_id = seed + 1;
        self.storage.put(&record).await?;
        *last_id = Some(record.local_id);

        tracing::info!(
            local_id = record.local_id,
            method = %record.method,
            url = %record.url,
            "Queued write for replay"
        );
        Ok(record.local_id)
    }

    /// Snapshot of every queued record, ascending by `localId`.
    pub async fn drain_in_order(&self) -> Result<Vec<QueuedRequest>> {
        let mut records = self.storage.get_all::<QueuedRequest>().await?;
        records.sort_by_key(|record| record.local_id);
        Ok(records)
    }

    /// Remove one confirmed record.
    pub async fn remove(&self, local_id: i64) -> Result<()> {
        self.storage.delete::<QueuedRequest>(local_id).await
    }

    /// Remove every record.
    pub async fn remove_all(&self) -> Result<()> {
        self.storage.clear::<QueuedRequest>().await
    }

    pub async fn len(&self) -> Result<u64> {
        self.storage.count::<QueuedRequest>().await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    async fn persisted_max(&self) -> Result<i64> {
        Ok(self
            .drain_in_order()
            .await?
            .last()
            .map_or(0, |record| record.local_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::CURRENT_VERSION;
    use http::Method;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn favorite(id: i64, flag: bool) -> ApiRequest {
        ApiRequest::parse(
            Method::PUT,
            &format!("http://localhost:1337/restaurants/{id}?is_favorite={flag}"),
        )
        .unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn enqueue_then_drain_returns_serialized_request() {
        let queue = PendingWriteQueue::new(StorageService::in_memory(CURRENT_VERSION));
        let request = ApiRequest::parse(Method::POST, "http://localhost:1337/reviews")
            .unwrap()
            .with_json(&json!({"restaurant_id": 3, "name": "A"}))
            .unwrap();

        let local_id = queue.enqueue(request.clone()).await.unwrap();
        let drained = queue.drain_in_order().await.unwrap();

        let mut expected = serializer::serialize(request);
        expected.local_id = local_id;
        assert_eq!(drained, vec![expected]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn ids_increase_and_order_is_kept() {
        let queue = PendingWriteQueue::new(StorageService::in_memory(CURRENT_VERSION));
        let mut ids = Vec::new();
        for id in 1..=5 {
            ids.push(queue.enqueue(favorite(id, true)).await.unwrap());
        }
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));

        let urls = queue
            .drain_in_order()
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.url)
            .collect::<Vec<_>>();
        assert_eq!(
            urls,
            (1..=5)
                .map(|id| format!("http://localhost:1337/restaurants/{id}?is_favorite=true"))
                .collect::<Vec<_>>()
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_enqueues_get_unique_ids() {
        let queue = Arc::new(PendingWriteQueue::new(StorageService::in_memory(
            CURRENT_VERSION,
        )));
        let tasks = (0..10)
            .map(|id| {
                let queue = Arc::clone(&queue);
                tokio::spawn(async move { queue.enqueue(favorite(id, false)).await.unwrap() })
            })
            .collect::<Vec<_>>();

        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 10);
        assert_eq!(queue.len().await.unwrap(), 10);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn counter_resumes_after_reopen() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("mirror.db");

        let first = {
            let queue = PendingWriteQueue::new(StorageService::open_path(&path, CURRENT_VERSION));
            queue.enqueue(favorite(1, true)).await.unwrap();
            queue.enqueue(favorite(2, true)).await.unwrap()
        };

        let queue = PendingWriteQueue::new(StorageService::open_path(&path, CURRENT_VERSION));
        let next = queue.enqueue(favorite(3, true)).await.unwrap();
        assert!(next > first);
        assert_eq!(queue.len().await.unwrap(), 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn remove_and_remove_all() {
        let queue = PendingWriteQueue::new(StorageService::in_memory(CURRENT_VERSION));
        let first = queue.enqueue(favorite(1, true)).await.unwrap();
        queue.enqueue(favorite(2, true)).await.unwrap();
        queue.enqueue(favorite(3, true)).await.unwrap();

        queue.remove(first).await.unwrap();
        assert_eq!(queue.len().await.unwrap(), 2);
        assert!(queue
            .drain_in_order()
            .await
            .unwrap()
            .iter()
            .all(|record| record.local_id != first));

        queue.remove_all().await.unwrap();
        assert!(queue.is_empty().await.unwrap());

        // ids are never reused after removal
        let later = queue.enqueue(favorite(4, true)).await.unwrap();
        assert!(later > first);
    }
}
