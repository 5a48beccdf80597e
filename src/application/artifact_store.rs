// Scratch area holding one report run's panel images and document
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const IMAGE_DIR: &str = "images";
const REPORT_FILE: &str = "report.pdf";

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Reserve a uniquely named area under `base_dir`. Nothing touches the
    /// filesystem until `prepare`.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        let root = base_dir.as_ref().join(uuid::Uuid::new_v4().to_string());
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn image_dir(&self) -> PathBuf {
        self.root.join(IMAGE_DIR)
    }

    pub async fn prepare(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(self.image_dir()).await
    }

    pub fn path_for(&self, panel_id: u64) -> PathBuf {
        self.image_dir().join(format!("image{}.png", panel_id))
    }

    pub fn report_path(&self) -> PathBuf {
        self.root.join(REPORT_FILE)
    }

    /// Remove the whole area. Safe to call repeatedly or before `prepare`;
    /// failures are logged and swallowed.
    pub async fn cleanup(&self) {
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => tracing::debug!("Removed artifact store {}", self.root.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::error!("cleaning up tmp dir {} error: {}", self.root.display(), e),
        }
    }
}
