//! Command-line element descriptions.
//!
//! Format: `<kind>:<path>[,key=value...]`, for example
//!
//! ```text
//! raw:receipt.bin,lang=escpos,density=24
//! image:logo.png,x=10,y=20,lang=zpl
//! xml:labels.xml,tag=label
//! rtf:letter.rtf,encoding=cp1252
//! pdf:invoice.pdf
//! ```

use spoolprep_shared::config::PrepareConfig;
use spoolprep_shared::{Charset, DotDensity, ElementKind, LanguageType};
use std::path::PathBuf;

use crate::element::{ElementConfig, ImagePlacement, PrintElement, RawConfig, XmlConfig};
use crate::error::PrepareError;
use crate::source::SourceData;

pub fn parse_element(arg: &str, defaults: &PrepareConfig) -> Result<PrintElement, PrepareError> {
    let bad = |reason: String| PrepareError::InvalidConfiguration(format!("'{}': {}", arg, reason));

    let (kind, rest) = arg
        .split_once(':')
        .ok_or_else(|| bad("expected <kind>:<path>".to_string()))?;
    let kind: ElementKind = kind.parse().map_err(bad)?;
    let mut parts = rest.split(',');
    let path = parts.next().filter(|p| !p.is_empty()).ok_or_else(|| bad("missing path".to_string()))?;

    let mut charset = Charset::for_label(&defaults.default_encoding)
        .ok_or_else(|| bad(format!("unknown default encoding '{}'", defaults.default_encoding)))?;
    let mut language = None;
    let mut density = DotDensity(defaults.default_dot_density);
    let mut placement = ImagePlacement::default();
    let mut tag = None;

    for option in parts {
        let (key, value) = option
            .split_once('=')
            .ok_or_else(|| bad(format!("option '{}' is not key=value", option)))?;
        match (key.trim(), kind) {
            ("encoding", _) => {
                charset = Charset::for_label(value).ok_or_else(|| bad(format!("unknown encoding '{}'", value)))?
            }
            ("lang", ElementKind::Raw | ElementKind::Image) => language = Some(LanguageType::resolve(value)),
            ("density", ElementKind::Raw) => {
                density = DotDensity::parse(value).ok_or_else(|| bad(format!("bad dot density '{}'", value)))?
            }
            ("x", ElementKind::Image) => placement.x = value.trim().parse().map_err(|_| bad(format!("bad x '{}'", value)))?,
            ("y", ElementKind::Image) => placement.y = value.trim().parse().map_err(|_| bad(format!("bad y '{}'", value)))?,
            ("tag", ElementKind::Xml) => tag = Some(value.trim().to_string()),
            (key, kind) => return Err(bad(format!("option '{}' does not apply to {} elements", key, kind))),
        }
    }

    let config = match kind {
        ElementKind::Raw => ElementConfig::Raw(RawConfig {
            language,
            dot_density: density,
        }),
        ElementKind::Image => ElementConfig::Image(ImagePlacement { language, ..placement }),
        ElementKind::Pdf => ElementConfig::Pdf,
        ElementKind::Rtf => ElementConfig::Rtf,
        ElementKind::Xml => ElementConfig::Xml(XmlConfig {
            tag: tag.ok_or_else(|| bad("xml elements need tag=<name>".to_string()))?,
        }),
    };
    PrintElement::new(kind, SourceData::Locator(PathBuf::from(path)), charset, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_raw_with_options() {
        let element = parse_element("raw:receipt.bin,lang=ESC/POS,density=double", &PrepareConfig::default()).unwrap();
        assert_eq!(element.kind(), ElementKind::Raw);
        assert_eq!(element.language(), Some(LanguageType::EscPos));
        assert_eq!(element.dot_density(), DotDensity(33));
        assert_eq!(element.source(), &SourceData::Locator(PathBuf::from("receipt.bin")));
    }

    #[test]
    fn parses_image_placement_and_encoding() {
        let element = parse_element("image:logo.png,x=10,y=-4,encoding=latin1", &PrepareConfig::default()).unwrap();
        assert_eq!((element.image_x(), element.image_y()), (10, -4));
        assert_eq!(element.charset().name(), "windows-1252");
        assert_eq!(element.language(), None);

        let element = parse_element("image:logo.png,lang=escpos", &PrepareConfig::default()).unwrap();
        assert_eq!(element.language(), Some(LanguageType::EscPos));
    }

    #[test]
    fn defaults_come_from_config() {
        let defaults = PrepareConfig {
            default_dot_density: 39,
            ..PrepareConfig::default()
        };
        let element = parse_element("raw:a.bin", &defaults).unwrap();
        assert_eq!(element.dot_density(), DotDensity::TRIPLE);
        assert_eq!(element.language(), None);
    }

    #[test]
    fn rejects_bad_arguments() {
        let defaults = PrepareConfig::default();
        for arg in [
            "receipt.bin",
            "tiff:scan.tif",
            "raw:",
            "xml:labels.xml",
            "pdf:invoice.pdf,lang=zpl",
            "raw:a.bin,density=lots",
            "raw:a.bin,verbose",
        ] {
            let err = parse_element(arg, &defaults).unwrap_err();
            assert!(matches!(err, PrepareError::InvalidConfiguration(_)), "{}", arg);
        }
    }
}
