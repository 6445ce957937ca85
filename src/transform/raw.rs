// src/transform/raw.rs - RAW pass-through
use spoolprep_shared::{Charset, ElementKind};

use crate::error::PrepareError;
use crate::source::ResolvedSource;

/// Bytes pass through untouched; text is encoded with `charset`. Language and
/// dot density stay on the element for the emitter.
pub fn prepare(source: ResolvedSource<'_>, charset: Charset) -> Result<Vec<u8>, PrepareError> {
    let bytes = match source {
        ResolvedSource::Bytes(bytes) => bytes.into_owned(),
        ResolvedSource::Text(text) => charset
            .encode(&text)
            .ok_or_else(|| {
                PrepareError::invalid_source(
                    ElementKind::Raw,
                    format!("text contains characters not representable in {}", charset),
                )
            })?
            .into_owned(),
    };
    if bytes.is_empty() {
        return Err(PrepareError::invalid_source(ElementKind::Raw, "no commands to send"));
    }
    Ok(bytes)
}
