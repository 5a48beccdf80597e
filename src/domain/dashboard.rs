// Dashboard domain model

/// Rendering category of a panel. Only single-value panels get the short
/// image rectangle; everything else is laid out like a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKind {
    Graph,
    SingleStat,
    Table,
    Text,
    Other,
}

impl PanelKind {
    /// Map a Grafana panel `type` string onto a kind.
    pub fn from_type(panel_type: &str) -> Self {
        match panel_type {
            "graph" | "timeseries" => PanelKind::Graph,
            "singlestat" | "stat" | "gauge" => PanelKind::SingleStat,
            "table" => PanelKind::Table,
            "text" => PanelKind::Text,
            _ => PanelKind::Other,
        }
    }

    pub fn is_single_stat(&self) -> bool {
        matches!(self, PanelKind::SingleStat)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub id: u64,
    pub title: String,
    pub row_title: String,
    pub kind: PanelKind,
}

impl Panel {
    pub fn new(id: u64, title: impl Into<String>, row_title: impl Into<String>, kind: PanelKind) -> Self {
        Self {
            id,
            title: title.into(),
            row_title: row_title.into(),
            kind,
        }
    }

    /// Caption drawn above the panel image.
    pub fn caption(&self) -> String {
        format!("Row: {}, Panel: {}", self.row_title, self.title)
    }
}

/// A dashboard as fetched from the remote service. Panel order is page order.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub title: String,
    pub panels: Vec<Panel>,
}

impl Dashboard {
    pub fn new(title: String, panels: Vec<Panel>) -> Self {
        Self { title, panels }
    }
}
