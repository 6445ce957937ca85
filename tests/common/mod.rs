// Shared fixtures for the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use lopdf::{dictionary, Document, Object, Stream};
use spoolprep::{PrepareError, PrepareEvent, PrepareObserver, SourceResolver};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 255, 255, 255]));
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

pub fn pdf_bytes(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            })
            .into()
        })
        .collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Serves locators from memory, sleeping first when a delay is registered
/// for the path.
#[derive(Debug, Default)]
pub struct MemoryResolver {
    files: HashMap<PathBuf, (Vec<u8>, Duration)>,
}

impl MemoryResolver {
    pub fn with(mut self, path: &str, bytes: impl Into<Vec<u8>>, delay: Duration) -> Self {
        self.files.insert(PathBuf::from(path), (bytes.into(), delay));
        self
    }
}

#[async_trait]
impl SourceResolver for MemoryResolver {
    async fn fetch(&self, locator: &Path) -> Result<Vec<u8>, PrepareError> {
        let (bytes, delay) = self
            .files
            .get(locator)
            .cloned()
            .ok_or_else(|| PrepareError::Source(format!("{} not found", locator.display())))?;
        tokio::time::sleep(delay).await;
        Ok(bytes)
    }
}

/// Records every event it sees, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<PrepareEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<PrepareEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn completed_sequence(&self) -> Vec<uuid::Uuid> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, PrepareEvent::Completed { .. }))
            .map(|e| e.element())
            .collect()
    }
}

impl PrepareObserver for RecordingObserver {
    fn notify(&self, event: &PrepareEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
