// Source trait for dashboard metadata and rendered panel images
use crate::domain::dashboard::{Dashboard, Panel};
use crate::domain::time_range::TimeRange;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

/// Body of a rendered panel image, consumed chunk by chunk.
pub type ImageStream = BoxStream<'static, anyhow::Result<Bytes>>;

#[async_trait]
pub trait DashboardSource: Send + Sync {
    /// Fetch dashboard metadata by name
    async fn dashboard(&self, name: &str) -> anyhow::Result<Dashboard>;

    /// Open the rendered image of one panel. Requests are bounded by the
    /// source's client timeout.
    async fn panel_image(
        &self,
        panel: &Panel,
        dashboard_name: &str,
        time_range: &TimeRange,
    ) -> anyhow::Result<ImageStream>;
}
