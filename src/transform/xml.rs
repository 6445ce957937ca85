// src/transform/xml.rs - Base64 commands embedded in XML
//! XML command extraction.
//!
//! Commands are embedded in an XML document as base64 text inside a named
//! element, e.g.
//!
//! ```xml
//! <job><label>XlhBXkZPNTAsNTBeRkRIZWxsb15GU15YWg==</label></job>
//! ```
//!
//! The first element whose local name equals the element's tag wins. Text
//! from nested nodes is concatenated and whitespace is ignored before
//! decoding.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use spoolprep_shared::ElementKind;

use crate::error::PrepareError;

pub fn extract(xml: &str, tag: &str) -> Result<Vec<u8>, PrepareError> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| PrepareError::invalid_source(ElementKind::Xml, format!("malformed XML: {}", e)))?;
    let node = doc
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == tag)
        .ok_or_else(|| PrepareError::invalid_source(ElementKind::Xml, format!("no <{}> element in document", tag)))?;

    let encoded: String = node
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .flat_map(|t| t.chars())
        .filter(|c| !c.is_whitespace())
        .collect();
    if encoded.is_empty() {
        return Err(PrepareError::invalid_source(ElementKind::Xml, format!("<{}> is empty", tag)));
    }
    STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| PrepareError::invalid_source(ElementKind::Xml, format!("<{}> is not valid base64: {}", tag, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_first_matching_tag() {
        let xml = "<job><meta>x</meta><label>\n  G0BI\n  ZWxsbw==\n</label><label>AAAA</label></job>";
        assert_eq!(extract(xml, "label").unwrap(), b"\x1b@Hello".to_vec());
    }

    #[test]
    fn matches_local_name_inside_namespaces() {
        let xml = r#"<p:job xmlns:p="urn:print"><p:cmd>Xlha</p:cmd></p:job>"#;
        assert_eq!(extract(xml, "cmd").unwrap(), b"^XZ".to_vec());
    }

    #[test]
    fn reports_missing_empty_and_bad_payloads() {
        for (xml, tag) in [
            ("<job/>", "label"),
            ("<job><label>  </label></job>", "label"),
            ("<job><label>@@@</label></job>", "label"),
            ("<job><label>", "label"),
        ] {
            let err = extract(xml, tag).unwrap_err();
            assert!(matches!(err, PrepareError::InvalidSourceData { kind: ElementKind::Xml, .. }), "{}", xml);
        }
    }
}
