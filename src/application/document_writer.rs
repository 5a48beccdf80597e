// Drawing surface used to assemble the report document
use crate::infrastructure::config::RectSize;
use std::path::Path;

/// Cursor-based page writer. Coordinates are points from the top-left
/// corner of the current page. Writers do blocking file and encoding work
/// and stay on the thread that created them.
pub trait DocumentWriter {
    fn add_page(&mut self);

    fn set_x(&mut self, x: f32);

    fn set_y(&mut self, y: f32);

    /// Write one line of text at the cursor.
    fn cell(&mut self, text: &str);

    /// Move the cursor down by `height`.
    fn br(&mut self, height: f32);

    /// Place the image stored at `path` scaled into `rect` at `(x, y)`.
    fn image(&mut self, path: &Path, x: f32, y: f32, rect: RectSize) -> anyhow::Result<()>;

    /// Serialize everything drawn so far.
    fn finalize(&mut self) -> Vec<u8>;
}

/// Creates one fresh writer per report, titled after the dashboard.
pub trait DocumentWriterFactory: Send + Sync {
    fn create(&self, title: &str) -> anyhow::Result<Box<dyn DocumentWriter>>;
}
