// Grafana HTTP client implementation
use crate::application::dashboard_source::{DashboardSource, ImageStream};
use crate::domain::dashboard::{Dashboard, Panel, PanelKind};
use crate::domain::time_range::TimeRange;
use crate::infrastructure::config::GrafanaSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;

const SINGLE_STAT_SIZE: (u32, u32) = (300, 150);
const GRAPH_SIZE: (u32, u32) = (1000, 500);

#[derive(Debug, Clone)]
pub struct GrafanaClient {
    client: reqwest::Client,
    url: String,
    api_token: Option<String>,
    theme: String,
    server_timeout: u64,
}

#[derive(Debug, Deserialize)]
struct DashboardResponse {
    dashboard: DashboardJson,
}

#[derive(Debug, Deserialize)]
struct DashboardJson {
    #[serde(default)]
    title: String,
    #[serde(default)]
    rows: Vec<RowJson>,
    #[serde(default)]
    panels: Vec<PanelJson>,
}

#[derive(Debug, Deserialize)]
struct RowJson {
    #[serde(default)]
    title: String,
    #[serde(default)]
    panels: Vec<PanelJson>,
}

#[derive(Debug, Deserialize)]
struct PanelJson {
    #[serde(default)]
    id: u64,
    #[serde(default)]
    title: String,
    #[serde(rename = "type", default)]
    panel_type: String,
    /// Children of a collapsed row.
    #[serde(default)]
    panels: Vec<PanelJson>,
}

impl PanelJson {
    fn into_panel(self, row_title: &str) -> Panel {
        Panel::new(self.id, self.title, row_title, PanelKind::from_type(&self.panel_type))
    }
}

impl DashboardJson {
    /// Flatten legacy `rows` or the newer flat panel list into page order.
    fn into_dashboard(self) -> Dashboard {
        let mut panels = Vec::new();

        if !self.rows.is_empty() {
            for row in self.rows {
                for panel in row.panels {
                    panels.push(panel.into_panel(&row.title));
                }
            }
            return Dashboard::new(self.title, panels);
        }

        let mut row_title = String::new();
        for panel in self.panels {
            if panel.panel_type == "row" {
                row_title = panel.title;
                for nested in panel.panels {
                    panels.push(nested.into_panel(&row_title));
                }
            } else {
                panels.push(panel.into_panel(&row_title));
            }
        }
        Dashboard::new(self.title, panels)
    }
}

impl GrafanaClient {
    pub fn new(settings: &GrafanaSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.client_timeout())
            .build()
            .context("Failed to build Grafana HTTP client")?;

        Ok(Self {
            client,
            url: settings.url.trim_end_matches('/').to_string(),
            api_token: settings.api_token.clone(),
            theme: settings.theme.clone(),
            server_timeout: settings.server_timeout,
        })
    }

    fn dashboard_url(&self, name: &str) -> String {
        format!("{}/api/dashboards/db/{}", self.url, urlencoding::encode(name))
    }

    fn panel_png_url(&self, panel: &Panel, dashboard_name: &str, time_range: &TimeRange) -> String {
        let (width, height) = if panel.kind.is_single_stat() {
            SINGLE_STAT_SIZE
        } else {
            GRAPH_SIZE
        };
        format!(
            "{}/render/dashboard-solo/db/{}?panelId={}&from={}&to={}&theme={}&width={}&height={}&timeout={}",
            self.url,
            urlencoding::encode(dashboard_name),
            panel.id,
            urlencoding::encode(&time_range.from),
            urlencoding::encode(&time_range.to),
            urlencoding::encode(&self.theme),
            width,
            height,
            self.server_timeout
        )
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let mut request = self.client.get(url);
        if let Some(token) = &self.api_token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to send request to Grafana: {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Grafana request {} failed with status {}: {}", url, status, body);
        }

        Ok(response)
    }
}

#[async_trait]
impl DashboardSource for GrafanaClient {
    async fn dashboard(&self, name: &str) -> Result<Dashboard> {
        let url = self.dashboard_url(name);
        tracing::debug!("Fetching dashboard {} from {}", name, url);

        let response = self
            .get(&url)
            .await?
            .json::<DashboardResponse>()
            .await
            .context("Failed to parse Grafana dashboard response")?;

        let dashboard = response.dashboard.into_dashboard();
        tracing::debug!("Dashboard {} has {} panels", name, dashboard.panels.len());
        Ok(dashboard)
    }

    async fn panel_image(
        &self,
        panel: &Panel,
        dashboard_name: &str,
        time_range: &TimeRange,
    ) -> Result<ImageStream> {
        let url = self.panel_png_url(panel, dashboard_name, time_range);
        tracing::debug!("Fetching image for panel {} from {}", panel.id, url);

        let response = self.get(&url).await?;
        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(anyhow::Error::from))
            .boxed())
    }
}
