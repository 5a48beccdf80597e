// Errors surfaced by report generation
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Hint attached to fetch failures; the renderer tends to time out on long ranges.
pub const TIMEOUT_HINT: &str = "It is recommended to select a time range within 6 hours on the dashboard, \
otherwise the Grafana renderer might time out";

/// Failure of a single panel download, or of a fetch worker itself.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("getting image for panel {panel_id} error: {source}")]
    Remote {
        panel_id: u64,
        source: anyhow::Error,
    },
    #[error("creating image file {} for panel {panel_id} error: {source}", .path.display())]
    Create {
        panel_id: u64,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("copying image for panel {panel_id} to file error: {source}")]
    Copy {
        panel_id: u64,
        source: anyhow::Error,
    },
    #[error("fetch worker terminated abnormally: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl FetchError {
    pub fn panel_id(&self) -> Option<u64> {
        match self {
            FetchError::Remote { panel_id, .. }
            | FetchError::Create { panel_id, .. }
            | FetchError::Copy { panel_id, .. } => Some(*panel_id),
            FetchError::Worker(_) => None,
        }
    }
}

/// Progress of one report run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportStage {
    Init,
    DashboardFetched,
    StoreReady,
    PanelsFetched,
    DocumentAssembled,
    Ready,
    Failed,
}

impl fmt::Display for ReportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportStage::Init => "init",
            ReportStage::DashboardFetched => "dashboard fetched",
            ReportStage::StoreReady => "store ready",
            ReportStage::PanelsFetched => "panels fetched",
            ReportStage::DocumentAssembled => "document assembled",
            ReportStage::Ready => "ready",
            ReportStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("fetching dashboard {dashboard} error: {source}")]
    Dashboard {
        dashboard: String,
        source: anyhow::Error,
    },
    #[error("creating artifact store {} error: {source}", .path.display())]
    Store {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("fetching panel images for dashboard {dashboard} error: {source}. {hint}", hint = TIMEOUT_HINT)]
    Fetch {
        dashboard: String,
        source: FetchError,
    },
    #[error("assembling document for dashboard {dashboard} error: {source}")]
    Assemble {
        dashboard: String,
        source: anyhow::Error,
    },
    #[error("opening report document {} error: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ReportError {
    /// Last stage reached before the failure.
    pub fn stage(&self) -> ReportStage {
        match self {
            ReportError::Dashboard { .. } => ReportStage::Init,
            ReportError::Store { .. } => ReportStage::DashboardFetched,
            ReportError::Fetch { .. } => ReportStage::StoreReady,
            ReportError::Assemble { .. } | ReportError::Open { .. } => ReportStage::PanelsFetched,
        }
    }
}
