//! In-memory registry of trace view sessions
//!
//! Backed by a moka cache: bounded by `max_views`, idle views expire after
//! `idle_minutes` without access.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::view::TraceView;
use crate::core::config::ViewsConfig;
use crate::core::constants::VIEW_MAINTENANCE_INTERVAL_SECS;
use crate::data::TraceBackend;

#[derive(Clone)]
pub struct ViewRegistry {
    views: Cache<String, Arc<TraceView>>,
    backend: Arc<dyn TraceBackend>,
}

impl ViewRegistry {
    pub fn new(backend: Arc<dyn TraceBackend>, config: &ViewsConfig) -> Self {
        let views = Cache::builder()
            .max_capacity(config.max_views)
            .time_to_idle(Duration::from_secs(config.idle_minutes * 60))
            .eviction_listener(|id: Arc<String>, _view, cause| {
                tracing::debug!(view_id = %id, ?cause, "View evicted");
            })
            .build();
        Self { views, backend }
    }

    /// Create an empty view and return its id
    pub fn create(&self) -> (String, Arc<TraceView>) {
        let id = Uuid::new_v4().to_string();
        let view = Arc::new(TraceView::new(self.backend.clone()));
        self.views.insert(id.clone(), view.clone());
        tracing::debug!(view_id = %id, "View created");
        (id, view)
    }

    pub fn get(&self, id: &str) -> Option<Arc<TraceView>> {
        self.views.get(id)
    }

    /// Drop a view. Returns false if it did not exist.
    pub fn remove(&self, id: &str) -> bool {
        self.views.remove(id).is_some()
    }

    pub fn len(&self) -> u64 {
        self.views.run_pending_tasks();
        self.views.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn backend(&self) -> &Arc<dyn TraceBackend> {
        &self.backend
    }

    /// Periodically flush expired views until shutdown
    pub fn start_maintenance(&self, mut shutdown_rx: watch::Receiver<bool>) -> JoinHandle<()> {
        let views = self.views.clone();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(VIEW_MAINTENANCE_INTERVAL_SECS));
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        views.run_pending_tasks();
                        tracing::trace!(views = views.entry_count(), "View maintenance");
                    }
                    _ = shutdown_rx.changed() => {
                        tracing::debug!("View maintenance stopped");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{FileBackend, TimestampUnit};

    fn registry(max_views: u64) -> ViewRegistry {
        let backend: Arc<dyn TraceBackend> =
            Arc::new(FileBackend::new("/nonexistent", TimestampUnit::Micros));
        ViewRegistry::new(
            backend,
            &ViewsConfig {
                max_views,
                idle_minutes: 30,
            },
        )
    }

    #[test]
    fn test_create_get_remove() {
        let registry = registry(8);
        let (id, view) = registry.create();

        let fetched = registry.get(&id).unwrap();
        assert!(Arc::ptr_eq(&view, &fetched));
        assert_eq!(registry.len(), 1);

        assert!(registry.remove(&id));
        assert!(!registry.remove(&id));
        assert!(registry.get(&id).is_none());
    }

    #[test]
    fn test_ids_are_unique() {
        let registry = registry(8);
        let (a, _) = registry.create();
        let (b, _) = registry.create();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_maintenance_stops_on_shutdown() {
        let registry = registry(8);
        let (tx, rx) = watch::channel(false);
        let handle = registry.start_maintenance(rx);
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
