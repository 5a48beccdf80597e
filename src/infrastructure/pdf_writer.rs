// PDF document writer backed by printpdf
use crate::application::document_writer::{DocumentWriter, DocumentWriterFactory};
use crate::infrastructure::config::{FontSettings, RectSize};
use anyhow::{Context, Result};
use printpdf::font::ParsedFont;
use printpdf::image::RawImage;
use printpdf::xobject::{XObject, XObjectTransform};
use printpdf::{FontId, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, Pt, TextItem, TextMatrix, XObjectId};
use std::path::Path;

/// Fraction of the font size between the top of a text line and its baseline.
const BASELINE_RATIO: f32 = 0.8;

/// Writer with a top-left origin cursor, translated to PDF's bottom-left
/// coordinates when drawing.
pub struct PdfWriter {
    document: PdfDocument,
    font: FontId,
    font_size: f32,
    page: RectSize,
    current: Option<Vec<Op>>,
    x: f32,
    y: f32,
}

impl PdfWriter {
    pub fn new(title: &str, font_data: &[u8], font_size: f32, page: RectSize) -> Result<Self> {
        let mut document = PdfDocument::new(title);
        let mut warnings = Vec::new();
        let parsed = ParsedFont::from_bytes(font_data, 0, &mut warnings)
            .context("Failed to parse TTF font")?;
        let font = document.add_font(&parsed);

        Ok(Self {
            document,
            font,
            font_size,
            page,
            current: None,
            x: 0.0,
            y: 0.0,
        })
    }

    fn ops(&mut self) -> &mut Vec<Op> {
        self.current.get_or_insert_with(Vec::new)
    }

    fn close_page(&mut self) {
        if let Some(ops) = self.current.take() {
            let width: Mm = Pt(self.page.width).into();
            let height: Mm = Pt(self.page.height).into();
            self.document.pages.push(PdfPage::new(width, height, ops));
        }
    }
}

impl DocumentWriter for PdfWriter {
    fn add_page(&mut self) {
        self.close_page();
        self.current = Some(Vec::new());
        self.x = 0.0;
        self.y = 0.0;
    }

    fn set_x(&mut self, x: f32) {
        self.x = x;
    }

    fn set_y(&mut self, y: f32) {
        self.y = y;
    }

    fn cell(&mut self, text: &str) {
        let font = self.font.clone();
        let size = self.font_size;
        let baseline = self.page.height - (self.y + size * BASELINE_RATIO);
        let x = self.x;

        let ops = self.ops();
        ops.push(Op::StartTextSection);
        ops.push(Op::SetFontSize {
            size: Pt(size),
            font: font.clone(),
        });
        ops.push(Op::SetTextMatrix {
            matrix: TextMatrix::Translate(Pt(x), Pt(baseline)),
        });
        ops.push(Op::WriteText {
            items: vec![TextItem::Text(text.to_string())],
            font,
        });
        ops.push(Op::EndTextSection);
    }

    fn br(&mut self, height: f32) {
        self.y += height;
        self.x = 0.0;
    }

    fn image(&mut self, path: &Path, x: f32, y: f32, rect: RectSize) -> Result<()> {
        let data = std::fs::read(path).with_context(|| format!("reading image {}", path.display()))?;
        let mut warnings = Vec::new();
        let image = RawImage::decode_from_bytes(&data, &mut warnings)
            .map_err(|e| anyhow::anyhow!("decoding image {}: {}", path.display(), e))?;
        if image.width == 0 || image.height == 0 {
            anyhow::bail!("image {} is empty", path.display());
        }

        let transform = XObjectTransform {
            translate_x: Some(Pt(x)),
            translate_y: Some(Pt(self.page.height - (y + rect.height))),
            scale_x: Some(rect.width / image.width as f32),
            scale_y: Some(rect.height / image.height as f32),
            rotate: None,
            dpi: Some(72.0),
        };

        let id = XObjectId::new();
        self.document
            .resources
            .xobjects
            .map
            .insert(id.clone(), XObject::Image(image));
        self.ops().push(Op::UseXobject { id, transform });
        Ok(())
    }

    fn finalize(&mut self) -> Vec<u8> {
        self.close_page();
        let mut warnings = Vec::new();
        let bytes = self.document.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            tracing::debug!("PDF serialization produced {} warnings", warnings.len());
        }
        bytes
    }
}

/// Builds PDF writers sharing one font and page size.
pub struct PdfWriterFactory {
    font: FontSettings,
    page: RectSize,
}

impl PdfWriterFactory {
    pub fn new(font: FontSettings, page: RectSize) -> Self {
        Self { font, page }
    }
}

impl DocumentWriterFactory for PdfWriterFactory {
    fn create(&self, title: &str) -> Result<Box<dyn DocumentWriter>> {
        let ttf_path = self.font.ttf_path();
        let font_data = std::fs::read(&ttf_path)
            .with_context(|| format!("add ttf font {} ({})", self.font.family, ttf_path.display()))?;
        let writer = PdfWriter::new(title, &font_data, self.font.size, self.page)?;
        Ok(Box::new(writer))
    }
}
