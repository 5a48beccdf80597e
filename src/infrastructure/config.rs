use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const ENV_PREFIX: &str = "REPORTER";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct ReporterConfig {
    pub grafana: GrafanaSettings,
    pub font: FontSettings,
    pub rect: RectSettings,
    pub position: PositionSettings,
    pub reporter: RunSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct GrafanaSettings {
    pub url: String,
    #[serde(skip_serializing)]
    pub api_token: Option<String>,
    pub theme: String,
    /// Seconds before an HTTP request to Grafana is abandoned.
    pub client_timeout: u64,
    /// Seconds the renderer may spend on one panel, forwarded to Grafana.
    pub server_timeout: u64,
    /// Reserved. Fetches are never retried.
    pub retry_interval: u64,
}

impl GrafanaSettings {
    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.client_timeout)
    }
}

impl Default for GrafanaSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000".to_string(),
            api_token: None,
            theme: "dark".to_string(),
            client_timeout: 300,
            server_timeout: 300,
            retry_interval: 10,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct FontSettings {
    pub family: String,
    pub ttf: String,
    pub dir: PathBuf,
    pub size: f32,
}

impl FontSettings {
    pub fn ttf_path(&self) -> PathBuf {
        self.dir.join(&self.ttf)
    }
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            family: "roboto".to_string(),
            ttf: "RobotoMedium.ttf".to_string(),
            dir: PathBuf::from("fonts"),
            size: 14.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct RectSize {
    pub width: f32,
    pub height: f32,
}

impl RectSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RectSettings {
    pub page: RectSize,
    pub graph: RectSize,
    pub singlestat: RectSize,
}

impl Default for RectSettings {
    fn default() -> Self {
        Self {
            page: RectSize::new(595.28, 841.89),
            graph: RectSize::new(480.0, 240.0),
            singlestat: RectSize::new(480.0, 93.0),
        }
    }
}

/// Offsets in points from the top-left corner of a page.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PositionSettings {
    pub x: f32,
    pub title_y1: f32,
    pub title_y2: f32,
    pub image_y1: f32,
    pub image_y2: f32,
    /// Line spacing on the cover page.
    pub br: f32,
}

impl Default for PositionSettings {
    fn default() -> Self {
        Self {
            x: 50.0,
            title_y1: 60.0,
            title_y2: 350.0,
            image_y1: 80.0,
            image_y2: 370.0,
            br: 20.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RunSettings {
    /// Concurrent panel downloads per report.
    pub workers: usize,
    pub tmp_dir: Option<PathBuf>,
}

impl RunSettings {
    pub fn tmp_dir(&self) -> PathBuf {
        self.tmp_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("grafana-reporter"))
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            workers: 5,
            tmp_dir: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8686".to_string(),
        }
    }
}

/// Load settings from an optional file at `path` (any format the `config`
/// crate recognises by extension) and `REPORTER_<SECTION>__<KEY>` variables.
/// Anything not set keeps its default.
pub fn load_reporter_config(path: &str) -> anyhow::Result<ReporterConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
