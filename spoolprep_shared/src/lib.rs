// spoolprep_shared: value types and configuration shared by the preparation engine and its tools

pub mod charset;
pub mod config;
pub mod kind;
pub mod language;

pub use charset::Charset;
pub use kind::ElementKind;
pub use language::{DotDensity, LanguageType};
