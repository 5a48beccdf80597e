// Lays out fetched panel images two per page
use crate::application::artifact_store::ArtifactStore;
use crate::application::document_writer::{DocumentWriter, DocumentWriterFactory};
use crate::application::error::ReportError;
use crate::domain::dashboard::{Dashboard, Panel};
use crate::domain::layout::{Band, LayoutSlot};
use crate::domain::time_range::TimeRange;
use crate::infrastructure::config::{PositionSettings, RectSettings, RectSize};
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    rect: RectSettings,
    position: PositionSettings,
}

impl DocumentAssembler {
    pub fn new(rect: RectSettings, position: PositionSettings) -> Self {
        Self { rect, position }
    }

    /// Draw the report on a blocking thread, write it into the store and
    /// reopen it for reading.
    pub async fn assemble(
        &self,
        dashboard_name: &str,
        dashboard: &Dashboard,
        time_range: &TimeRange,
        store: &ArtifactStore,
        writers: Arc<dyn DocumentWriterFactory>,
    ) -> Result<tokio::fs::File, ReportError> {
        let assembler = self.clone();
        let dashboard = dashboard.clone();
        let time_range = time_range.clone();
        let drawing_store = store.clone();
        let span = tracing::Span::current();

        let rendered = tokio::task::spawn_blocking(move || -> anyhow::Result<Vec<u8>> {
            let _entered = span.enter();
            let mut writer = writers.create(&dashboard.title)?;
            assembler.draw(&dashboard, &time_range, &drawing_store, writer.as_mut(), Utc::now());
            Ok(writer.finalize())
        })
        .await
        .map_err(anyhow::Error::from)
        .and_then(|result| result);
        let bytes = rendered.map_err(|source| ReportError::Assemble {
            dashboard: dashboard_name.to_string(),
            source,
        })?;

        let path = store.report_path();
        // Serialization has no error channel; a failed write shows up when reopening.
        if let Err(e) = tokio::fs::write(&path, &bytes).await {
            tracing::error!("writing report {} error: {}", path.display(), e);
        }

        tokio::fs::File::open(&path)
            .await
            .map_err(|source| ReportError::Open { path, source })
    }

    /// Cover page followed by panels in dashboard order. Image failures are
    /// logged and leave the slot blank.
    pub fn draw(
        &self,
        dashboard: &Dashboard,
        time_range: &TimeRange,
        store: &ArtifactStore,
        writer: &mut dyn DocumentWriter,
        now: DateTime<Utc>,
    ) {
        self.draw_cover(dashboard, time_range, writer, now);

        for (index, panel) in dashboard.panels.iter().enumerate() {
            let slot = LayoutSlot::for_index(index);
            let (title_y, image_y) = match slot.band {
                Band::Top => (self.position.title_y1, self.position.image_y1),
                Band::Bottom => (self.position.title_y2, self.position.image_y2),
            };

            if slot.starts_page() {
                writer.add_page();
            }
            writer.set_x(self.position.x);
            writer.set_y(title_y);
            writer.cell(&panel.caption());

            let image_path = store.path_for(panel.id);
            match writer.image(&image_path, self.position.x, image_y, self.rect_for(panel)) {
                Ok(()) => tracing::info!("rendering image to PDF: {}", image_path.display()),
                Err(e) => tracing::warn!(
                    "rendering image {} for panel {} to PDF error: {}",
                    image_path.display(),
                    panel.id,
                    e
                ),
            }
        }
    }

    fn draw_cover(
        &self,
        dashboard: &Dashboard,
        time_range: &TimeRange,
        writer: &mut dyn DocumentWriter,
        now: DateTime<Utc>,
    ) {
        writer.add_page();
        writer.set_x(self.position.x);
        writer.set_y(self.position.title_y1);
        writer.cell(&format!("Dashboard: {}", dashboard.title));
        writer.br(self.position.br);
        writer.set_x(self.position.x);
        writer.cell(&time_range.describe_at(now));
    }

    fn rect_for(&self, panel: &Panel) -> RectSize {
        if panel.kind.is_single_stat() {
            self.rect.singlestat
        } else {
            self.rect.graph
        }
    }
}
