//! Prepared output: the single tagged result a worker hands back to its element.

use image::DynamicImage;
use lopdf::Document;
use spoolprep_shared::ElementKind;
use std::fmt;

/// Exactly one of these is installed on an element once it is prepared.
#[derive(Debug)]
pub enum PreparedOutput {
    /// Command bytes, from RAW pass-through or XML extraction.
    Bytes(Vec<u8>),
    Image(RasterImage),
    Surface(RenderedSurface),
    Document(PdfDocument),
}

impl PreparedOutput {
    /// Whether this output belongs in the slot for `kind`.
    pub fn matches(&self, kind: ElementKind) -> bool {
        match self {
            PreparedOutput::Bytes(_) => kind.yields_bytes(),
            PreparedOutput::Image(_) => kind == ElementKind::Image,
            PreparedOutput::Surface(_) => kind == ElementKind::Rtf,
            PreparedOutput::Document(_) => kind == ElementKind::Pdf,
        }
    }

    pub fn slot_name(&self) -> &'static str {
        match self {
            PreparedOutput::Bytes(_) => "bytes",
            PreparedOutput::Image(_) => "image",
            PreparedOutput::Surface(_) => "surface",
            PreparedOutput::Document(_) => "document",
        }
    }
}

/// A decoded raster image ready for placement.
#[derive(Debug, Clone)]
pub struct RasterImage {
    image: DynamicImage,
}

impl RasterImage {
    pub fn new(image: DynamicImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_inner(self) -> DynamicImage {
        self.image
    }
}

/// One laid-out line of rich text.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceLine {
    pub text: String,
    /// Largest font size used on the line.
    pub font_size_pt: f32,
    pub width_pt: f32,
}

/// Rich text laid out into measurable lines. Dimensions are in points.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSurface {
    pub lines: Vec<SurfaceLine>,
    pub width: u32,
    pub height: u32,
}

impl RenderedSurface {
    /// The plain text of the surface, one line per row.
    pub fn text(&self) -> String {
        self.lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>().join("\n")
    }
}

/// Media box of a single page, in PDF user-space units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub width: f32,
    pub height: f32,
}

/// A parsed, paginated document. Holds the parser's document handle; the
/// consumer drops it once the pages have been emitted.
pub struct PdfDocument {
    document: Document,
    pages: Vec<PageBox>,
}

impl PdfDocument {
    pub(crate) fn new(document: Document, pages: Vec<PageBox>) -> Self {
        Self { document, pages }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[PageBox] {
        &self.pages
    }

    pub fn version(&self) -> &str {
        &self.document.version
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }
}

impl fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfDocument")
            .field("version", &self.document.version)
            .field("pages", &self.pages)
            .finish()
    }
}
