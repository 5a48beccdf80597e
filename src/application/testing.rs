// In-memory collaborators for exercising the report pipeline
use crate::application::dashboard_source::{DashboardSource, ImageStream};
use crate::application::document_writer::{DocumentWriter, DocumentWriterFactory};
use crate::domain::dashboard::{Dashboard, Panel, PanelKind};
use crate::domain::time_range::TimeRange;
use crate::infrastructure::config::RectSize;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn panel(id: u64, kind: PanelKind) -> Panel {
    Panel::new(id, format!("Panel {}", id), "Overview", kind)
}

pub fn graph_dashboard(panel_count: u64) -> Dashboard {
    let panels = (1..=panel_count).map(|id| panel(id, PanelKind::Graph)).collect();
    Dashboard::new("X".to_string(), panels)
}

pub fn image_bytes(panel_id: u64) -> Vec<u8> {
    format!("png-{}", panel_id).into_bytes()
}

#[derive(Default)]
pub struct FakeSource {
    dashboards: HashMap<String, Dashboard>,
    /// Panels whose image request is rejected outright.
    reject: HashSet<u64>,
    /// Panels whose stream breaks after the first chunk.
    break_stream: HashSet<u64>,
    fetches: Mutex<HashMap<u64, usize>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeSource {
    pub fn with_dashboard(dashboard: Dashboard) -> Self {
        let mut source = Self::default();
        source.dashboards.insert(dashboard.title.clone(), dashboard);
        source
    }

    pub fn rejecting(mut self, panel_id: u64) -> Self {
        self.reject.insert(panel_id);
        self
    }

    pub fn breaking(mut self, panel_id: u64) -> Self {
        self.break_stream.insert(panel_id);
        self
    }

    pub fn fetch_counts(&self) -> HashMap<u64, usize> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DashboardSource for FakeSource {
    async fn dashboard(&self, name: &str) -> anyhow::Result<Dashboard> {
        self.dashboards
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("dashboard {} not found", name))
    }

    async fn panel_image(
        &self,
        panel: &Panel,
        _dashboard_name: &str,
        _time_range: &TimeRange,
    ) -> anyhow::Result<ImageStream> {
        *self.fetches.lock().unwrap().entry(panel.id).or_insert(0) += 1;

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(2)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.reject.contains(&panel.id) {
            anyhow::bail!("render of panel {} timed out", panel.id);
        }

        let bytes = image_bytes(panel.id);
        let (head, tail) = bytes.split_at(bytes.len() / 2);
        let second = if self.break_stream.contains(&panel.id) {
            Err(anyhow::anyhow!("connection reset"))
        } else {
            Ok(Bytes::copy_from_slice(tail))
        };
        Ok(futures::stream::iter(vec![Ok(Bytes::copy_from_slice(head)), second]).boxed())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    AddPage,
    SetX(f32),
    SetY(f32),
    Cell(String),
    Br(f32),
    Image {
        path: PathBuf,
        x: f32,
        y: f32,
        rect: RectSize,
    },
}

/// Writer that records every call; image placement fails for chosen paths.
#[derive(Clone, Default)]
pub struct RecordingWriter {
    pub ops: Arc<Mutex<Vec<DrawOp>>>,
    failing_images: HashSet<PathBuf>,
}

impl RecordingWriter {
    /// Fail placement of any image whose path ends with `path`.
    pub fn failing_on(mut self, path: impl Into<PathBuf>) -> Self {
        self.failing_images.insert(path.into());
        self
    }

    pub fn ops(&self) -> Vec<DrawOp> {
        self.ops.lock().unwrap().clone()
    }

    /// Recorded operations split into pages.
    pub fn pages(&self) -> Vec<Vec<DrawOp>> {
        let mut pages: Vec<Vec<DrawOp>> = Vec::new();
        for op in self.ops() {
            match op {
                DrawOp::AddPage => pages.push(Vec::new()),
                other => {
                    if let Some(page) = pages.last_mut() {
                        page.push(other);
                    }
                }
            }
        }
        pages
    }

    fn record(&self, op: DrawOp) {
        self.ops.lock().unwrap().push(op);
    }
}

impl DocumentWriter for RecordingWriter {
    fn add_page(&mut self) {
        self.record(DrawOp::AddPage);
    }

    fn set_x(&mut self, x: f32) {
        self.record(DrawOp::SetX(x));
    }

    fn set_y(&mut self, y: f32) {
        self.record(DrawOp::SetY(y));
    }

    fn cell(&mut self, text: &str) {
        self.record(DrawOp::Cell(text.to_string()));
    }

    fn br(&mut self, height: f32) {
        self.record(DrawOp::Br(height));
    }

    fn image(&mut self, path: &Path, x: f32, y: f32, rect: RectSize) -> anyhow::Result<()> {
        if self.failing_images.iter().any(|failing| path.ends_with(failing)) {
            anyhow::bail!("unsupported image format");
        }
        self.record(DrawOp::Image {
            path: path.to_path_buf(),
            x,
            y,
            rect,
        });
        Ok(())
    }

    fn finalize(&mut self) -> Vec<u8> {
        let pages = self.pages().len();
        format!("%PDF pages={}", pages).into_bytes()
    }
}

/// Hands out clones of one recording writer so tests can inspect it.
#[derive(Clone, Default)]
pub struct RecordingWriterFactory {
    pub writer: RecordingWriter,
    pub titles: Arc<Mutex<Vec<String>>>,
}

impl RecordingWriterFactory {
    pub fn with_writer(writer: RecordingWriter) -> Self {
        Self {
            writer,
            ..Self::default()
        }
    }
}

impl DocumentWriterFactory for RecordingWriterFactory {
    fn create(&self, title: &str) -> anyhow::Result<Box<dyn DocumentWriter>> {
        self.titles.lock().unwrap().push(title.to_string());
        Ok(Box::new(self.writer.clone()))
    }
}

pub struct FailingWriterFactory;

impl DocumentWriterFactory for FailingWriterFactory {
    fn create(&self, _title: &str) -> anyhow::Result<Box<dyn DocumentWriter>> {
        anyhow::bail!("font file not found")
    }
}
