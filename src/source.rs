// src/source.rs - Element source data and locator resolution
use async_trait::async_trait;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

use crate::error::PrepareError;

/// What an element was built from. Locators are only read when the element
/// is prepared, never at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceData {
    Bytes(Vec<u8>),
    /// Text to be encoded with the element's charset.
    Text(String),
    Locator(PathBuf),
}

impl SourceData {
    pub fn describe(&self) -> String {
        match self {
            SourceData::Bytes(b) => format!("{} bytes", b.len()),
            SourceData::Text(t) => format!("{} chars of text", t.chars().count()),
            SourceData::Locator(p) => p.display().to_string(),
        }
    }
}

impl From<Vec<u8>> for SourceData {
    fn from(bytes: Vec<u8>) -> Self {
        SourceData::Bytes(bytes)
    }
}

impl From<&[u8]> for SourceData {
    fn from(bytes: &[u8]) -> Self {
        SourceData::Bytes(bytes.to_vec())
    }
}

impl From<String> for SourceData {
    fn from(text: String) -> Self {
        SourceData::Text(text)
    }
}

impl From<&str> for SourceData {
    fn from(text: &str) -> Self {
        SourceData::Text(text.to_string())
    }
}

impl From<PathBuf> for SourceData {
    fn from(path: PathBuf) -> Self {
        SourceData::Locator(path)
    }
}

/// Source material after resolution, borrowed from the element when it was
/// already inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSource<'a> {
    Bytes(Cow<'a, [u8]>),
    Text(Cow<'a, str>),
}

/// Fetches the bytes behind a locator. Runs inside the preparation worker,
/// so it may block on I/O without stalling the caller of `prepare`.
#[async_trait]
pub trait SourceResolver: Send + Sync + std::fmt::Debug {
    async fn fetch(&self, locator: &Path) -> Result<Vec<u8>, PrepareError>;
}

/// Fetch the bytes behind a locator ahead of the transform. Inline sources
/// need no fetching and yield `None`.
pub(crate) async fn fetch(
    source: &SourceData,
    resolver: &dyn SourceResolver,
) -> Result<Option<Vec<u8>>, PrepareError> {
    match source {
        SourceData::Locator(path) => resolver.fetch(path).await.map(Some),
        SourceData::Bytes(_) | SourceData::Text(_) => Ok(None),
    }
}

/// Borrow the transform's input from the element, preferring fetched bytes.
pub(crate) fn view<'a>(source: &'a SourceData, fetched: Option<&'a [u8]>) -> ResolvedSource<'a> {
    match (fetched, source) {
        (Some(bytes), _) => ResolvedSource::Bytes(Cow::Borrowed(bytes)),
        (None, SourceData::Bytes(bytes)) => ResolvedSource::Bytes(Cow::Borrowed(bytes.as_slice())),
        (None, SourceData::Text(text)) => ResolvedSource::Text(Cow::Borrowed(text.as_str())),
        (None, SourceData::Locator(_)) => ResolvedSource::Bytes(Cow::Borrowed(&[][..])),
    }
}

/// Reads locators from the local filesystem, relative to `base_dir`.
#[derive(Debug, Clone)]
pub struct FsResolver {
    base_dir: PathBuf,
    max_bytes: u64,
}

impl FsResolver {
    pub fn new(base_dir: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            base_dir: base_dir.into(),
            max_bytes,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn full_path(&self, locator: &Path) -> PathBuf {
        if locator.is_absolute() {
            locator.to_path_buf()
        } else {
            self.base_dir.join(locator)
        }
    }
}

impl Default for FsResolver {
    fn default() -> Self {
        Self::new(".", 64 * 1024 * 1024)
    }
}

#[async_trait]
impl SourceResolver for FsResolver {
    async fn fetch(&self, locator: &Path) -> Result<Vec<u8>, PrepareError> {
        let path = self.full_path(locator);
        tracing::debug!("Reading element source: {}", path.display());
        let io_error = |e: std::io::Error| PrepareError::Source(format!("{}: {}", path.display(), e));
        let file = tokio::fs::File::open(&path).await.map_err(io_error)?;
        let metadata = file.metadata().await.map_err(io_error)?;
        if !metadata.is_file() {
            return Err(PrepareError::Source(format!("{} is not a file", path.display())));
        }

        // The file may grow after it was opened, so the limit is enforced on
        // the bytes actually read.
        let capacity = metadata.len().min(self.max_bytes) as usize;
        let mut bytes = Vec::with_capacity(capacity);
        file.take(self.max_bytes.saturating_add(1))
            .read_to_end(&mut bytes)
            .await
            .map_err(io_error)?;
        if bytes.len() as u64 > self.max_bytes {
            return Err(PrepareError::Source(format!(
                "{} exceeds the {} byte limit",
                path.display(),
                self.max_bytes
            )));
        }
        Ok(bytes)
    }
}
