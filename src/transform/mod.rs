// src/transform/mod.rs - Per-variant transform dispatch
//! Per-variant transforms. Each is a pure, synchronous function from resolved
//! source material to a [`PreparedOutput`]; the worker runs them on the
//! blocking pool.

pub mod pdf;
pub mod raster;
pub mod raw;
pub mod rtf;
pub mod xml;

use spoolprep_shared::config::Config;
use spoolprep_shared::{Charset, ElementKind};
use std::borrow::Cow;

use crate::element::ElementConfig;
use crate::error::PrepareError;
use crate::output::PreparedOutput;
use crate::source::ResolvedSource;

/// Layout metrics used when rendering rich text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RtfLayout {
    pub page_width_pt: f32,
    pub default_font_size_pt: f32,
}

impl Default for RtfLayout {
    fn default() -> Self {
        Self {
            page_width_pt: 576.0,
            default_font_size_pt: 12.0,
        }
    }
}

impl From<&Config> for RtfLayout {
    fn from(config: &Config) -> Self {
        Self {
            page_width_pt: config.rtf.page_width_pt,
            default_font_size_pt: config.rtf.default_font_size_pt,
        }
    }
}

/// Run the transform matching `config`'s variant.
pub fn dispatch(
    config: &ElementConfig,
    source: ResolvedSource<'_>,
    charset: Charset,
    layout: &RtfLayout,
) -> Result<PreparedOutput, PrepareError> {
    match config {
        ElementConfig::Raw(_) => raw::prepare(source, charset).map(PreparedOutput::Bytes),
        ElementConfig::Image(_) => {
            let bytes = binary(ElementKind::Image, source)?;
            raster::decode(&bytes).map(PreparedOutput::Image)
        }
        ElementConfig::Pdf => {
            let bytes = binary(ElementKind::Pdf, source)?;
            pdf::parse(&bytes).map(PreparedOutput::Document)
        }
        ElementConfig::Rtf => {
            let text = textual(ElementKind::Rtf, source, charset)?;
            rtf::render(&text, layout).map(PreparedOutput::Surface)
        }
        ElementConfig::Xml(xml) => {
            let text = textual(ElementKind::Xml, source, charset)?;
            xml::extract(&text, &xml.tag).map(PreparedOutput::Bytes)
        }
    }
}

fn binary<'a>(kind: ElementKind, source: ResolvedSource<'a>) -> Result<Cow<'a, [u8]>, PrepareError> {
    match source {
        ResolvedSource::Bytes(bytes) => Ok(bytes),
        ResolvedSource::Text(_) => Err(PrepareError::invalid_source(kind, "expected binary data, got text")),
    }
}

fn textual<'a>(
    kind: ElementKind,
    source: ResolvedSource<'a>,
    charset: Charset,
) -> Result<Cow<'a, str>, PrepareError> {
    let bytes = match source {
        ResolvedSource::Text(text) => return Ok(text),
        ResolvedSource::Bytes(bytes) => bytes,
    };
    if let Some(bom) = Charset::sniff_bom(&bytes) {
        if bom != charset {
            return Err(PrepareError::invalid_source(
                kind,
                format!("byte-order mark announces {} but the element is {}", bom, charset),
            ));
        }
    }
    let malformed = || PrepareError::invalid_source(kind, format!("not valid {} text", charset));
    match bytes {
        Cow::Borrowed(bytes) => charset.decode(bytes).ok_or_else(malformed),
        Cow::Owned(bytes) => charset
            .decode(&bytes)
            .map(|text| Cow::Owned(text.into_owned()))
            .ok_or_else(malformed),
    }
}
