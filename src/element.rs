//! Print elements: one unit of print content plus its write-once prepared
//! state.
//!
//! An element moves `Unprepared -> Preparing -> Prepared`. Only the worker
//! spawned by [`PrintElement::prepare`] writes the prepared output, and it
//! does so exactly once. The state byte is stored with `Release` after the
//! output is installed and loaded with `Acquire` by readers, so a reader that
//! sees `is_prepared() == true` also sees the output.
//!
//! A failed preparation returns the element to `Unprepared` and leaves every
//! output slot empty.

use chrono::{DateTime, Utc};
use spoolprep_shared::{Charset, DotDensity, ElementKind, LanguageType};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::PrepareError;
use crate::output::{PdfDocument, PreparedOutput, RasterImage, RenderedSurface};
use crate::preparer::{ElementPreparer, PrepareHandle};
use crate::source::SourceData;

const UNPREPARED: u8 = 0;
const PREPARING: u8 = 1;
const PREPARED: u8 = 2;

/// Settings for RAW elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawConfig {
    pub language: Option<LanguageType>,
    pub dot_density: DotDensity,
}

/// Device coordinates of an image element, plus the printer language the
/// raster is emitted in when it goes out as raw commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImagePlacement {
    pub x: i32,
    pub y: i32,
    pub language: Option<LanguageType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlConfig {
    /// Name of the element holding the base64 command payload.
    pub tag: String,
}

/// Variant-specific configuration. Each arm carries only what its variant
/// uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementConfig {
    Raw(RawConfig),
    Image(ImagePlacement),
    Pdf,
    Rtf,
    Xml(XmlConfig),
}

impl ElementConfig {
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementConfig::Raw(_) => ElementKind::Raw,
            ElementConfig::Image(_) => ElementKind::Image,
            ElementConfig::Pdf => ElementKind::Pdf,
            ElementConfig::Rtf => ElementKind::Rtf,
            ElementConfig::Xml(_) => ElementKind::Xml,
        }
    }

    /// The configuration a variant gets when the caller supplies none. XML
    /// has no sensible default tag.
    pub fn default_for(kind: ElementKind) -> Option<ElementConfig> {
        match kind {
            ElementKind::Raw => Some(ElementConfig::Raw(RawConfig::default())),
            ElementKind::Image => Some(ElementConfig::Image(ImagePlacement::default())),
            ElementKind::Pdf => Some(ElementConfig::Pdf),
            ElementKind::Rtf => Some(ElementConfig::Rtf),
            ElementKind::Xml => None,
        }
    }
}

/// Externally visible progress of an element's preparation.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementStatus {
    Unprepared,
    Preparing,
    Prepared,
    /// The last attempt failed; the element is unprepared again.
    Failed(PrepareError),
}

#[derive(Debug)]
struct Prepared {
    output: PreparedOutput,
    prepared_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct PrintElement {
    id: Uuid,
    kind: ElementKind,
    source: SourceData,
    charset: Charset,
    config: ElementConfig,
    sequence: Option<u32>,
    state: AtomicU8,
    prepared: OnceLock<Prepared>,
    status: watch::Sender<ElementStatus>,
}

impl PrintElement {
    /// Build an element. Fails with `InvalidConfiguration` when `config`
    /// belongs to a different variant or is incomplete. The source is not
    /// looked at until preparation.
    pub fn new(
        kind: ElementKind,
        source: impl Into<SourceData>,
        charset: Charset,
        config: ElementConfig,
    ) -> Result<Self, PrepareError> {
        if config.kind() != kind {
            return Err(PrepareError::InvalidConfiguration(format!(
                "{} configuration given for a {} element",
                config.kind(),
                kind
            )));
        }
        if let ElementConfig::Xml(xml) = &config {
            if xml.tag.trim().is_empty() {
                return Err(PrepareError::InvalidConfiguration("xml element requires a tag".to_string()));
            }
        }
        Ok(Self::unchecked(kind, source.into(), charset, config))
    }

    /// A RAW element with no declared language.
    pub fn raw(source: impl Into<SourceData>, charset: Charset) -> Self {
        Self::unchecked(ElementKind::Raw, source.into(), charset, ElementConfig::Raw(RawConfig::default()))
    }

    /// A RAW element in a specific printer language. Unknown language tags
    /// resolve to [`LanguageType::Unknown`].
    pub fn raw_with_language(
        source: impl Into<SourceData>,
        charset: Charset,
        language: &str,
        dot_density: DotDensity,
    ) -> Self {
        let config = RawConfig {
            language: Some(LanguageType::resolve(language)),
            dot_density,
        };
        Self::unchecked(ElementKind::Raw, source.into(), charset, ElementConfig::Raw(config))
    }

    pub fn image(source: impl Into<SourceData>, charset: Charset, x: i32, y: i32) -> Self {
        Self::unchecked(
            ElementKind::Image,
            source.into(),
            charset,
            ElementConfig::Image(ImagePlacement { x, y, language: None }),
        )
    }

    /// An IMAGE element destined for a raw-command printer.
    pub fn image_with_language(
        source: impl Into<SourceData>,
        charset: Charset,
        x: i32,
        y: i32,
        language: &str,
    ) -> Self {
        let placement = ImagePlacement {
            x,
            y,
            language: Some(LanguageType::resolve(language)),
        };
        Self::unchecked(ElementKind::Image, source.into(), charset, ElementConfig::Image(placement))
    }

    pub fn xml(source: impl Into<SourceData>, charset: Charset, tag: &str) -> Result<Self, PrepareError> {
        Self::new(
            ElementKind::Xml,
            source,
            charset,
            ElementConfig::Xml(XmlConfig { tag: tag.to_string() }),
        )
    }

    /// A PDF or RTF element. Other kinds carry configuration and have their
    /// own constructors.
    pub fn document(kind: ElementKind, source: impl Into<SourceData>, charset: Charset) -> Result<Self, PrepareError> {
        match kind {
            ElementKind::Pdf => Self::new(kind, source, charset, ElementConfig::Pdf),
            ElementKind::Rtf => Self::new(kind, source, charset, ElementConfig::Rtf),
            other => Err(PrepareError::InvalidConfiguration(format!(
                "{} elements need variant configuration",
                other
            ))),
        }
    }

    fn unchecked(kind: ElementKind, source: SourceData, charset: Charset, config: ElementConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            source,
            charset,
            config,
            sequence: None,
            state: AtomicU8::new(UNPREPARED),
            prepared: OnceLock::new(),
            status: watch::Sender::new(ElementStatus::Unprepared),
        }
    }

    /// Position among sibling elements. Set by the owning job before the
    /// element is shared.
    pub fn assign_sequence(&mut self, sequence: u32) {
        self.sequence = Some(sequence);
    }

    /// Start preparing on `preparer`. Returns as soon as the worker has been
    /// spawned.
    ///
    /// At most one preparation may be in flight per element: a second call
    /// while one is running is rejected with `ContractViolation`, and a call
    /// on a prepared element with `SchedulingFailure`.
    pub fn prepare(self: &Arc<Self>, preparer: &ElementPreparer) -> Result<PrepareHandle, PrepareError> {
        preparer.spawn(Arc::clone(self))
    }

    pub(crate) fn begin(&self) -> Result<(), PrepareError> {
        match self.state.compare_exchange(UNPREPARED, PREPARING, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => {
                self.status.send_replace(ElementStatus::Preparing);
                Ok(())
            }
            Err(PREPARED) => Err(PrepareError::SchedulingFailure(format!("element {} is already prepared", self.id))),
            Err(_) => Err(PrepareError::ContractViolation(format!(
                "element {} is already being prepared",
                self.id
            ))),
        }
    }

    /// Record a failed attempt. Only an in-flight preparation can fail.
    pub(crate) fn abort(&self, error: PrepareError) {
        if self
            .state
            .compare_exchange(PREPARING, UNPREPARED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.status.send_replace(ElementStatus::Failed(error));
        }
    }

    /// Completion callback. Installs `output` and marks the element prepared.
    ///
    /// Rejects, logs, and discards the output when the element is not being
    /// prepared, is already prepared, or `output` belongs to another variant.
    /// An installed output is never replaced.
    pub fn on_prepared(&self, output: PreparedOutput) -> Result<(), PrepareError> {
        let reason = match self.state.load(Ordering::Acquire) {
            PREPARING if !output.matches(self.kind) => {
                Some(format!("{} output does not belong to a {} element", output.slot_name(), self.kind))
            }
            PREPARING => None,
            PREPARED => Some("element is already prepared".to_string()),
            _ => Some("element was not being prepared".to_string()),
        };
        if let Some(reason) = reason {
            tracing::warn!(element = %self.id, kind = %self.kind, "Discarding {} output: {}", output.slot_name(), reason);
            return Err(PrepareError::ContractViolation(reason));
        }

        let prepared = Prepared {
            output,
            prepared_at: Utc::now(),
        };
        if let Err(rejected) = self.prepared.set(prepared) {
            let reason = "element is already prepared".to_string();
            tracing::warn!(
                element = %self.id,
                kind = %self.kind,
                "Discarding {} output: {}",
                rejected.output.slot_name(),
                reason
            );
            return Err(PrepareError::ContractViolation(reason));
        }
        self.state.store(PREPARED, Ordering::Release);
        self.status.send_replace(ElementStatus::Prepared);
        Ok(())
    }

    pub fn is_prepared(&self) -> bool {
        self.state.load(Ordering::Acquire) == PREPARED
    }

    pub fn status(&self) -> ElementStatus {
        self.status.borrow().clone()
    }

    /// Wait for the current preparation to finish. Resolves immediately
    /// with a `ContractViolation` if no preparation was ever started.
    pub async fn wait_prepared(&self) -> Result<(), PrepareError> {
        let mut rx = self.status.subscribe();
        let status = rx
            .wait_for(|s| !matches!(s, ElementStatus::Preparing))
            .await
            .map_err(|e| PrepareError::Worker(e.to_string()))?
            .clone();
        match status {
            ElementStatus::Prepared => Ok(()),
            ElementStatus::Failed(e) => Err(e),
            ElementStatus::Unprepared | ElementStatus::Preparing => Err(PrepareError::ContractViolation(format!(
                "element {} was never prepared",
                self.id
            ))),
        }
    }

    fn installed(&self) -> Option<&Prepared> {
        if self.is_prepared() { self.prepared.get() } else { None }
    }

    pub fn output(&self) -> Option<&PreparedOutput> {
        self.installed().map(|p| &p.output)
    }

    pub fn prepared_at(&self) -> Option<DateTime<Utc>> {
        self.installed().map(|p| p.prepared_at)
    }

    /// Prepared command bytes (RAW and XML elements).
    pub fn prepared_data(&self) -> Option<&[u8]> {
        match self.output()? {
            PreparedOutput::Bytes(bytes) => Some(bytes.as_slice()),
            _ => None,
        }
    }

    pub fn raster_image(&self) -> Option<&RasterImage> {
        match self.output()? {
            PreparedOutput::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn rtf_surface(&self) -> Option<&RenderedSurface> {
        match self.output()? {
            PreparedOutput::Surface(surface) => Some(surface),
            _ => None,
        }
    }

    pub fn rtf_width(&self) -> Option<u32> {
        self.rtf_surface().map(|s| s.width)
    }

    pub fn rtf_height(&self) -> Option<u32> {
        self.rtf_surface().map(|s| s.height)
    }

    pub fn pdf_document(&self) -> Option<&PdfDocument> {
        match self.output()? {
            PreparedOutput::Document(document) => Some(document),
            _ => None,
        }
    }

    /// Take the prepared output, releasing the element. Used by the emitter
    /// to dispose of decoded images and document handles after printing.
    pub fn into_output(self) -> Option<PreparedOutput> {
        if !self.is_prepared() {
            return None;
        }
        self.prepared.into_inner().map(|p| p.output)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn source(&self) -> &SourceData {
        &self.source
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    pub fn config(&self) -> &ElementConfig {
        &self.config
    }

    pub fn sequence(&self) -> Option<u32> {
        self.sequence
    }

    /// Printer language of a RAW element, or of an IMAGE element emitted as
    /// raw commands.
    pub fn language(&self) -> Option<LanguageType> {
        match &self.config {
            ElementConfig::Raw(raw) => raw.language,
            ElementConfig::Image(placement) => placement.language,
            _ => None,
        }
    }

    pub fn dot_density(&self) -> DotDensity {
        match &self.config {
            ElementConfig::Raw(raw) => raw.dot_density,
            _ => DotDensity::default(),
        }
    }

    pub fn image_x(&self) -> i32 {
        match &self.config {
            ElementConfig::Image(placement) => placement.x,
            _ => 0,
        }
    }

    pub fn image_y(&self) -> i32 {
        match &self.config {
            ElementConfig::Image(placement) => placement.y,
            _ => 0,
        }
    }

    pub fn xml_tag(&self) -> Option<&str> {
        match &self.config {
            ElementConfig::Xml(xml) => Some(&xml.tag),
            _ => None,
        }
    }
}
