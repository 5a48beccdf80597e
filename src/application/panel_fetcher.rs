// Bounded-concurrency download of panel images into the artifact store
use crate::application::artifact_store::ArtifactStore;
use crate::application::dashboard_source::DashboardSource;
use crate::application::error::FetchError;
use crate::domain::dashboard::{Dashboard, Panel};
use crate::domain::time_range::TimeRange;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

pub const DEFAULT_WORKERS: usize = 5;

/// Fetches every panel of a dashboard with at most `workers` requests in
/// flight. A small budget keeps the Grafana renderer from timing out.
#[derive(Clone)]
pub struct PanelFetcher {
    source: Arc<dyn DashboardSource>,
    workers: usize,
}

impl PanelFetcher {
    pub fn new(source: Arc<dyn DashboardSource>, workers: usize) -> Self {
        Self {
            source,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Download all panel images. Every worker runs to completion before the
    /// outcome is decided; any failed panel fails the whole call. Images
    /// already written stay in the store.
    pub async fn fetch_all(
        &self,
        dashboard_name: &str,
        dashboard: &Dashboard,
        time_range: &TimeRange,
        store: &ArtifactStore,
    ) -> Result<Vec<PathBuf>, FetchError> {
        let capacity = dashboard.panels.len().max(1);

        let (queue_tx, queue_rx) = async_channel::bounded::<Panel>(capacity);
        for panel in &dashboard.panels {
            // Cannot fail: the queue holds every panel and is still open.
            let _ = queue_tx.try_send(panel.clone());
        }
        queue_tx.close();

        let (err_tx, mut err_rx) = mpsc::channel::<FetchError>(capacity);

        let mut workers = JoinSet::new();
        for worker_id in 0..self.workers {
            let queue = queue_rx.clone();
            let errors = err_tx.clone();
            let source = self.source.clone();
            let store = store.clone();
            let dashboard_name = dashboard_name.to_string();
            let time_range = time_range.clone();

            workers.spawn(async move {
                while let Ok(panel) = queue.recv().await {
                    match fetch_panel(source.as_ref(), &panel, &dashboard_name, &time_range, &store).await {
                        Ok(path) => tracing::debug!(worker_id, "Fetched panel {} to {}", panel.id, path.display()),
                        Err(e) => {
                            tracing::error!("creating image for panel ID {} error: {}", panel.id, e);
                            let _ = errors.try_send(e);
                        }
                    }
                }
            });
        }
        drop(err_tx);

        let mut worker_failures = Vec::new();
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("panel fetch worker error: {}", e);
                worker_failures.push(FetchError::from(e));
            }
        }

        let mut first_error = None;
        while let Some(e) = err_rx.recv().await {
            first_error.get_or_insert(e);
        }
        if let Some(e) = first_error.or_else(|| worker_failures.into_iter().next()) {
            return Err(e);
        }

        Ok(dashboard.panels.iter().map(|p| store.path_for(p.id)).collect())
    }
}

/// Stream one panel image into its file. Both the remote stream and the file
/// are dropped on every return path.
async fn fetch_panel(
    source: &dyn DashboardSource,
    panel: &Panel,
    dashboard_name: &str,
    time_range: &TimeRange,
    store: &ArtifactStore,
) -> Result<PathBuf, FetchError> {
    let mut body = source
        .panel_image(panel, dashboard_name, time_range)
        .await
        .map_err(|source| FetchError::Remote {
            panel_id: panel.id,
            source,
        })?;

    let path = store.path_for(panel.id);
    let mut file = tokio::fs::File::create(&path)
        .await
        .map_err(|source| FetchError::Create {
            panel_id: panel.id,
            path: path.clone(),
            source,
        })?;

    let copy_error = |source: anyhow::Error| FetchError::Copy {
        panel_id: panel.id,
        source,
    };
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(copy_error)?;
        file.write_all(&chunk)
            .await
            .map_err(|e| copy_error(e.into()))?;
    }
    file.flush().await.map_err(|e| copy_error(e.into()))?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{graph_dashboard, image_bytes, FakeSource};

    async fn prepared_store(base: &tempfile::TempDir) -> ArtifactStore {
        let store = ArtifactStore::new(base.path());
        store.prepare().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_every_panel_fetched_exactly_once() {
        for workers in [1, 2, 5, 16] {
            for panel_count in [0, 1, 4, 13] {
                let base = tempfile::tempdir().unwrap();
                let store = prepared_store(&base).await;
                let dashboard = graph_dashboard(panel_count);
                let source = Arc::new(FakeSource::with_dashboard(dashboard.clone()));
                let fetcher = PanelFetcher::new(source.clone(), workers);

                let paths = fetcher
                    .fetch_all("X", &dashboard, &TimeRange::default(), &store)
                    .await
                    .unwrap();

                assert_eq!(paths.len(), panel_count as usize);
                let counts = source.fetch_counts();
                assert_eq!(counts.len(), panel_count as usize);
                assert!(counts.values().all(|&n| n == 1));
                for id in 1..=panel_count {
                    let written = std::fs::read(store.path_for(id)).unwrap();
                    assert_eq!(written, image_bytes(id));
                }
            }
        }
    }

    #[tokio::test]
    async fn test_worker_budget_bounds_requests() {
        let base = tempfile::tempdir().unwrap();
        let store = prepared_store(&base).await;
        let dashboard = graph_dashboard(20);
        let source = Arc::new(FakeSource::with_dashboard(dashboard.clone()));
        let fetcher = PanelFetcher::new(source.clone(), 3);

        fetcher
            .fetch_all("X", &dashboard, &TimeRange::default(), &store)
            .await
            .unwrap();

        assert!(source.max_in_flight() <= 3);
        assert!(source.max_in_flight() >= 1);
    }

    #[tokio::test]
    async fn test_zero_workers_still_fetches() {
        let base = tempfile::tempdir().unwrap();
        let store = prepared_store(&base).await;
        let dashboard = graph_dashboard(3);
        let source = Arc::new(FakeSource::with_dashboard(dashboard.clone()));
        let fetcher = PanelFetcher::new(source.clone(), 0);

        assert_eq!(fetcher.workers(), 1);
        let paths = fetcher
            .fetch_all("X", &dashboard, &TimeRange::default(), &store)
            .await
            .unwrap();
        assert_eq!(paths.len(), 3);
    }

    #[tokio::test]
    async fn test_single_failure_fails_aggregate() {
        let base = tempfile::tempdir().unwrap();
        let store = prepared_store(&base).await;
        let dashboard = graph_dashboard(2);
        let source = Arc::new(FakeSource::with_dashboard(dashboard.clone()).rejecting(2));
        let fetcher = PanelFetcher::new(source.clone(), DEFAULT_WORKERS);

        let err = fetcher
            .fetch_all("X", &dashboard, &TimeRange::default(), &store)
            .await
            .unwrap_err();

        assert_eq!(err.panel_id(), Some(2));
        assert!(err.to_string().contains("panel 2"));
        // Panel 1 was still fetched and its image kept.
        assert_eq!(std::fs::read(store.path_for(1)).unwrap(), image_bytes(1));
    }

    #[tokio::test]
    async fn test_all_workers_finish_despite_failures() {
        let base = tempfile::tempdir().unwrap();
        let store = prepared_store(&base).await;
        let dashboard = graph_dashboard(10);
        let source = Arc::new(
            FakeSource::with_dashboard(dashboard.clone())
                .rejecting(1)
                .rejecting(4)
                .breaking(7),
        );
        let fetcher = PanelFetcher::new(source.clone(), 2);

        let err = fetcher
            .fetch_all("X", &dashboard, &TimeRange::default(), &store)
            .await
            .unwrap_err();

        assert!(matches!(err.panel_id(), Some(1) | Some(4) | Some(7)));
        assert_eq!(source.fetch_counts().len(), 10);
        for id in [2, 3, 5, 6, 8, 9, 10] {
            assert!(store.path_for(id).exists());
        }
    }

    #[tokio::test]
    async fn test_broken_stream_is_copy_error() {
        let base = tempfile::tempdir().unwrap();
        let store = prepared_store(&base).await;
        let dashboard = graph_dashboard(1);
        let source = Arc::new(FakeSource::with_dashboard(dashboard.clone()).breaking(1));
        let fetcher = PanelFetcher::new(source, 1);

        let err = fetcher
            .fetch_all("X", &dashboard, &TimeRange::default(), &store)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Copy { panel_id: 1, .. }));
    }

    #[tokio::test]
    async fn test_missing_store_is_create_error() {
        let base = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(base.path());
        let dashboard = graph_dashboard(1);
        let source = Arc::new(FakeSource::with_dashboard(dashboard.clone()));
        let fetcher = PanelFetcher::new(source, 1);

        let err = fetcher
            .fetch_all("X", &dashboard, &TimeRange::default(), &store)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Create { panel_id: 1, .. }));
    }
}
