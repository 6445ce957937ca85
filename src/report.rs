//! Serializable per-element summaries, as printed by the `spoolprep` tool.

use chrono::{DateTime, Utc};
use serde::Serialize;
use spoolprep_shared::ElementKind;

use crate::element::PrintElement;
use crate::error::PrepareError;
use crate::output::PreparedOutput;

#[derive(Debug, Clone, Serialize)]
pub struct ElementSummary {
    pub sequence: Option<u32>,
    pub id: String,
    pub kind: ElementKind,
    pub source: String,
    pub charset: String,
    pub prepared: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prepared_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dot_density: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement: Option<(i32, i32)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xml_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "slot", rename_all = "lowercase")]
pub enum OutputSummary {
    Bytes { len: usize },
    Image { width: u32, height: u32 },
    Surface { width: u32, height: u32, lines: usize },
    Document { pages: usize, version: String },
}

impl From<&PreparedOutput> for OutputSummary {
    fn from(output: &PreparedOutput) -> Self {
        match output {
            PreparedOutput::Bytes(bytes) => OutputSummary::Bytes { len: bytes.len() },
            PreparedOutput::Image(image) => OutputSummary::Image {
                width: image.width(),
                height: image.height(),
            },
            PreparedOutput::Surface(surface) => OutputSummary::Surface {
                width: surface.width,
                height: surface.height,
                lines: surface.lines.len(),
            },
            PreparedOutput::Document(document) => OutputSummary::Document {
                pages: document.page_count(),
                version: document.version().to_string(),
            },
        }
    }
}

impl ElementSummary {
    pub fn new(element: &PrintElement, result: Option<&Result<(), PrepareError>>) -> Self {
        let raw = element.kind() == ElementKind::Raw;
        Self {
            sequence: element.sequence(),
            id: element.id().to_string(),
            kind: element.kind(),
            source: element.source().describe(),
            charset: element.charset().name().to_string(),
            prepared: element.is_prepared(),
            prepared_at: element.prepared_at(),
            output: element.output().map(OutputSummary::from),
            language: element.language().map(|l| l.name().to_string()),
            dot_density: raw.then(|| element.dot_density().value()),
            placement: (element.kind() == ElementKind::Image).then(|| (element.image_x(), element.image_y())),
            xml_tag: element.xml_tag().map(str::to_string),
            error: result.and_then(|r| r.as_ref().err()).map(|e| e.to_string()),
        }
    }
}
