//! Printer command dialects and thermal dot density.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Printer command language a raw element is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanguageType {
    Zpl,
    Epl,
    Cpcl,
    EscP,
    EscPos,
    Unknown,
}

impl LanguageType {
    /// Resolve a free-form language tag. Matching ignores case and the
    /// separators people commonly type (`ESC/POS`, `esc-pos`, `ZPL II`).
    /// Unrecognized tags resolve to `Unknown` rather than failing.
    pub fn resolve(tag: &str) -> LanguageType {
        let normalized: String = tag
            .chars()
            .filter(|c| !matches!(c, '/' | '-' | '_' | ' ' | '\t'))
            .map(|c| c.to_ascii_uppercase())
            .collect();
        match normalized.as_str() {
            "ZPL" | "ZPLII" | "ZPL2" => LanguageType::Zpl,
            "EPL" | "EPL2" | "EPLII" => LanguageType::Epl,
            "CPCL" => LanguageType::Cpcl,
            "ESCP" | "ESCP2" => LanguageType::EscP,
            "ESCPOS" => LanguageType::EscPos,
            _ => LanguageType::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LanguageType::Zpl => "ZPL",
            LanguageType::Epl => "EPL",
            LanguageType::Cpcl => "CPCL",
            LanguageType::EscP => "ESCP",
            LanguageType::EscPos => "ESCPOS",
            LanguageType::Unknown => "UNKNOWN",
        }
    }

    /// Label/receipt dialects that drive thermal print heads, where dot
    /// density is meaningful.
    pub fn is_thermal(&self) -> bool {
        matches!(
            self,
            LanguageType::Zpl | LanguageType::Epl | LanguageType::Cpcl | LanguageType::EscPos
        )
    }
}

impl fmt::Display for LanguageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Dot density for ESC/P style bit-image commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DotDensity(pub u32);

impl DotDensity {
    pub const SINGLE: DotDensity = DotDensity(32);
    pub const DOUBLE: DotDensity = DotDensity(33);
    pub const TRIPLE: DotDensity = DotDensity(39);

    /// Accepts the named densities or a plain number.
    pub fn parse(value: &str) -> Option<DotDensity> {
        match value.trim().to_ascii_lowercase().as_str() {
            "single" => Some(Self::SINGLE),
            "double" => Some(Self::DOUBLE),
            "triple" => Some(Self::TRIPLE),
            other => other.parse::<u32>().ok().map(DotDensity),
        }
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl Default for DotDensity {
    fn default() -> Self {
        Self::SINGLE
    }
}

impl From<u32> for DotDensity {
    fn from(value: u32) -> Self {
        DotDensity(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_common_spellings() {
        assert_eq!(LanguageType::resolve("escpos"), LanguageType::EscPos);
        assert_eq!(LanguageType::resolve("ESC/POS"), LanguageType::EscPos);
        assert_eq!(LanguageType::resolve("esc/p"), LanguageType::EscP);
        assert_eq!(LanguageType::resolve("ZPL II"), LanguageType::Zpl);
        assert_eq!(LanguageType::resolve("epl2"), LanguageType::Epl);
        assert_eq!(LanguageType::resolve("cpcl"), LanguageType::Cpcl);
        assert_eq!(LanguageType::resolve("pcl"), LanguageType::Unknown);
        assert_eq!(LanguageType::resolve(""), LanguageType::Unknown);
    }

    #[test]
    fn escp_is_not_thermal() {
        assert!(LanguageType::EscPos.is_thermal());
        assert!(!LanguageType::EscP.is_thermal());
        assert!(!LanguageType::Unknown.is_thermal());
    }

    #[test]
    fn dot_density_names_and_numbers() {
        assert_eq!(DotDensity::default().value(), 32);
        assert_eq!(DotDensity::parse("double"), Some(DotDensity(33)));
        assert_eq!(DotDensity::parse("Triple"), Some(DotDensity(39)));
        assert_eq!(DotDensity::parse("24"), Some(DotDensity(24)));
        assert_eq!(DotDensity::parse("dense"), None);
    }
}
