// Report service - Use case for turning a dashboard into a PDF report
use crate::application::artifact_store::ArtifactStore;
use crate::application::dashboard_source::DashboardSource;
use crate::application::document_assembler::DocumentAssembler;
use crate::application::document_writer::DocumentWriterFactory;
use crate::application::error::{ReportError, ReportStage};
use crate::application::panel_fetcher::PanelFetcher;
use crate::domain::time_range::TimeRange;
use crate::infrastructure::config::ReporterConfig;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct ReportService {
    source: Arc<dyn DashboardSource>,
    writers: Arc<dyn DocumentWriterFactory>,
    fetcher: PanelFetcher,
    assembler: DocumentAssembler,
    tmp_dir: PathBuf,
}

impl ReportService {
    pub fn new(
        source: Arc<dyn DashboardSource>,
        writers: Arc<dyn DocumentWriterFactory>,
        config: &ReporterConfig,
    ) -> Self {
        Self {
            fetcher: PanelFetcher::new(source.clone(), config.reporter.workers),
            assembler: DocumentAssembler::new(config.rect.clone(), config.position.clone()),
            tmp_dir: config.reporter.tmp_dir(),
            source,
            writers,
        }
    }

    /// Start a report run. Nothing happens until `Report::generate`.
    pub fn report(&self, dashboard_name: &str, time_range: TimeRange) -> Report {
        Report {
            service: self.clone(),
            dashboard_name: dashboard_name.to_string(),
            time_range,
            store: ArtifactStore::new(&self.tmp_dir),
        }
    }
}

/// One report run. After reading the document returned by `generate`, call
/// `clean` to delete it together with the downloaded images.
pub struct Report {
    service: ReportService,
    dashboard_name: String,
    time_range: TimeRange,
    store: ArtifactStore,
}

impl Report {
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub async fn generate(&self) -> Result<tokio::fs::File, ReportError> {
        match self.run().await {
            Ok(document) => {
                self.enter(ReportStage::Ready);
                Ok(document)
            }
            Err(e) => {
                tracing::error!(stage = %e.stage(), "report for dashboard {} failed: {}", self.dashboard_name, e);
                self.enter(ReportStage::Failed);
                Err(e)
            }
        }
    }

    /// Delete everything this run wrote. Never fails.
    pub async fn clean(&self) {
        self.store.cleanup().await;
    }

    async fn run(&self) -> Result<tokio::fs::File, ReportError> {
        let service = &self.service;
        self.enter(ReportStage::Init);

        let dashboard = service
            .source
            .dashboard(&self.dashboard_name)
            .await
            .map_err(|source| ReportError::Dashboard {
                dashboard: self.dashboard_name.clone(),
                source,
            })?;
        self.enter(ReportStage::DashboardFetched);

        self.store.prepare().await.map_err(|source| ReportError::Store {
            path: self.store.image_dir(),
            source,
        })?;
        self.enter(ReportStage::StoreReady);

        service
            .fetcher
            .fetch_all(&self.dashboard_name, &dashboard, &self.time_range, &self.store)
            .await
            .map_err(|source| ReportError::Fetch {
                dashboard: self.dashboard_name.clone(),
                source,
            })?;
        self.enter(ReportStage::PanelsFetched);

        let document = service
            .assembler
            .assemble(
                &self.dashboard_name,
                &dashboard,
                &self.time_range,
                &self.store,
                service.writers.clone(),
            )
            .await?;
        self.enter(ReportStage::DocumentAssembled);

        Ok(document)
    }

    fn enter(&self, stage: ReportStage) {
        tracing::debug!(dashboard = %self.dashboard_name, %stage, "report stage");
    }
}
