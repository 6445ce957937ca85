// src/transform/pdf.rs - PDF parsing and page geometry
use lopdf::{Document, Object, ObjectId};
use spoolprep_shared::ElementKind;

use crate::error::PrepareError;
use crate::output::{PageBox, PdfDocument};

// US Letter, used when a page carries no MediaBox of its own.
const LETTER: PageBox = PageBox { width: 612.0, height: 792.0 };

/// Parse document bytes into a paginated handle. Encrypted documents and
/// documents without pages cannot be printed and are rejected.
pub fn parse(bytes: &[u8]) -> Result<PdfDocument, PrepareError> {
    let document = Document::load_mem(bytes)
        .map_err(|e| PrepareError::invalid_source(ElementKind::Pdf, format!("parse failed: {}", e)))?;
    if document.is_encrypted() {
        return Err(PrepareError::invalid_source(ElementKind::Pdf, "encrypted documents are not supported"));
    }
    let page_ids: Vec<ObjectId> = document.get_pages().into_values().collect();
    if page_ids.is_empty() {
        return Err(PrepareError::invalid_source(ElementKind::Pdf, "document has no pages"));
    }
    let pages = page_ids.iter().map(|id| media_box(&document, *id).unwrap_or(LETTER)).collect();
    Ok(PdfDocument::new(document, pages))
}

fn media_box(document: &Document, page_id: ObjectId) -> Option<PageBox> {
    let page = document.get_object(page_id).ok()?.as_dict().ok()?;
    let rect = match page.get(b"MediaBox").ok()? {
        Object::Array(values) => values,
        Object::Reference(id) => document.get_object(*id).ok()?.as_array().ok()?,
        _ => return None,
    };
    if rect.len() != 4 {
        return None;
    }
    let mut coords = [0f32; 4];
    for (slot, value) in coords.iter_mut().zip(rect.iter()) {
        *slot = number(value)?;
    }
    Some(PageBox {
        width: (coords[2] - coords[0]).abs(),
        height: (coords[3] - coords[1]).abs(),
    })
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Stream, dictionary};

    fn two_page_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let a4 = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        let bare = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![a4.into(), bare.into()],
                "Count" => 2,
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

    #[test]
    fn reads_pages_and_media_boxes() {
        let parsed = parse(&two_page_pdf()).unwrap();
        assert_eq!(parsed.page_count(), 2);
        assert_eq!(parsed.pages()[0], PageBox { width: 595.0, height: 842.0 });
        assert_eq!(parsed.pages()[1], LETTER);
    }

    #[test]
    fn malformed_bytes_are_invalid_source() {
        let err = parse(b"%PDF-1.4\nthis is not really a pdf").unwrap_err();
        assert!(matches!(err, PrepareError::InvalidSourceData { kind: ElementKind::Pdf, .. }));
    }
}
