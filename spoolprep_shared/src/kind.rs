//! Content-type discriminator for print elements.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The variant of a print element. Selects both the transform that prepares
/// it and the output slot the result lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Raw,
    Image,
    Pdf,
    Rtf,
    Xml,
}

impl ElementKind {
    pub const ALL: [ElementKind; 5] = [
        ElementKind::Raw,
        ElementKind::Image,
        ElementKind::Pdf,
        ElementKind::Rtf,
        ElementKind::Xml,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ElementKind::Raw => "raw",
            ElementKind::Image => "image",
            ElementKind::Pdf => "pdf",
            ElementKind::Rtf => "rtf",
            ElementKind::Xml => "xml",
        }
    }

    /// True for kinds whose prepared output is a command byte buffer.
    pub fn yields_bytes(&self) -> bool {
        matches!(self, ElementKind::Raw | ElementKind::Xml)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ElementKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(ElementKind::Raw),
            "image" | "img" => Ok(ElementKind::Image),
            "pdf" => Ok(ElementKind::Pdf),
            "rtf" => Ok(ElementKind::Rtf),
            "xml" => Ok(ElementKind::Xml),
            other => Err(format!("unknown element kind '{}'", other)),
        }
    }
}
