//! The engine context: owns every component and wires them together.

use std::sync::Arc;

use crate::cache::ResponseCache;
use crate::config::EngineConfig;
use crate::db::CURRENT_VERSION;
use crate::lifecycle::{ControlMessage, Lifecycle, LifecycleEvent, LifecycleState, Transition};
use crate::network::Network;
use crate::queue::PendingWriteQueue;
use crate::request::{ApiRequest, ApiResponse};
use crate::router::RequestRouter;
use crate::services::StorageService;
use crate::state::Connectivity;
use crate::sync::{FlushReport, SyncCoordinator};
use crate::Result;

/// Offline-first engine.
///
/// Components are created in dependency order: storage (schema and object
/// stores), write queue, sync coordinator, router. Storage opens lazily on
/// first use and stays open for the engine's lifetime.
pub struct Engine {
    config: EngineConfig,
    storage: StorageService,
    cache: ResponseCache,
    queue: Arc<PendingWriteQueue>,
    coordinator: Arc<SyncCoordinator>,
    router: RequestRouter,
    connectivity: Connectivity,
    lifecycle: Lifecycle,
}

impl Engine {
    pub fn new(config: EngineConfig, network: Arc<dyn Network>) -> Self {
        let storage = StorageService::open_path(&config.database_path, CURRENT_VERSION);
        let cache = ResponseCache::open_path(&config.cache_path);
        Self::assemble(config, storage, cache, network)
    }

    /// Engine backed by in-memory stores (primarily for tests).
    pub fn in_memory(config: EngineConfig, network: Arc<dyn Network>) -> Self {
        let storage = StorageService::in_memory(CURRENT_VERSION);
        Self::assemble(config, storage, ResponseCache::in_memory(), network)
    }

    fn assemble(
        config: EngineConfig,
        storage: StorageService,
        cache: ResponseCache,
        network: Arc<dyn Network>,
    ) -> Self {
        let connectivity = Connectivity::default();
        let queue = Arc::new(PendingWriteQueue::new(storage.clone()));
        let coordinator = Arc::new(SyncCoordinator::new(
            Arc::clone(&queue),
            storage.clone(),
            Arc::clone(&network),
        ));
        let router = RequestRouter::new(
            storage.clone(),
            Arc::clone(&queue),
            Arc::clone(&coordinator),
            network,
            cache.clone(),
            connectivity.clone(),
        );

        Self {
            config,
            storage,
            cache,
            queue,
            coordinator,
            router,
            connectivity,
            lifecycle: Lifecycle::new(),
        }
    }

    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn queue(&self) -> &PendingWriteQueue {
        &self.queue
    }

    pub const fn storage(&self) -> &StorageService {
        &self.storage
    }

    pub const fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub const fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    pub const fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Route a request through the engine.
    pub async fn handle(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.router.handle(request).await
    }

    /// Replay queued writes now.
    pub async fn flush(&self) -> Result<FlushReport> {
        self.coordinator.flush().await
    }

    /// Update connectivity. Coming back online flushes the queue.
    pub async fn set_online(&self, online: bool) -> Result<Option<FlushReport>> {
        if !self.connectivity.set_online(online) {
            return Ok(None);
        }
        tracing::info!("Connectivity restored, flushing queued writes");
        self.flush().await.map(Some)
    }

    /// Open storage and finish installation.
    pub async fn install(&self) -> Result<LifecycleState> {
        drop(self.storage.database().await?);
        let transition = self.lifecycle.apply(LifecycleEvent::Installed)?;
        self.after(transition).await
    }

    /// Take over from the waiting state.
    pub async fn activate(&self) -> Result<LifecycleState> {
        let transition = self.lifecycle.apply(LifecycleEvent::Activate)?;
        self.after(transition).await
    }

    /// Handle a message from the control channel.
    pub async fn post_message(&self, message: ControlMessage) -> Result<LifecycleState> {
        let transition = self.lifecycle.apply(message.event())?;
        self.after(transition).await
    }

    async fn after(&self, transition: Transition) -> Result<LifecycleState> {
        if transition.activated() {
            self.cache.remove_stale().await?;
        }
        Ok(transition.to)
    }
}
