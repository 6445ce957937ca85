//! Shared configuration for the preparation engine and the `spoolprep` tool.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [prepare]
//! timeout_ms = 15000
//! default_encoding = "utf-8"
//! default_dot_density = 32
//!
//! [rtf]
//! page_width_pt = 576.0
//! default_font_size_pt = 12.0
//!
//! [source]
//! base_dir = "/var/spool/prep"
//! max_source_bytes = 33554432
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub prepare: PrepareConfig,
    #[serde(default)]
    pub rtf: RtfConfig,
    #[serde(default)]
    pub source: SourceConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prepare.timeout_ms == Some(0) {
            return Err(ConfigError::Invalid("prepare.timeout_ms must be > 0 when set".to_string()));
        }
        if encoding_rs::Encoding::for_label(self.prepare.default_encoding.as_bytes()).is_none() {
            return Err(ConfigError::Invalid(format!(
                "prepare.default_encoding '{}' is not a known encoding label",
                self.prepare.default_encoding
            )));
        }
        if self.rtf.page_width_pt <= 0.0 {
            return Err(ConfigError::Invalid("rtf.page_width_pt must be > 0".to_string()));
        }
        if self.rtf.default_font_size_pt <= 0.0 {
            return Err(ConfigError::Invalid("rtf.default_font_size_pt must be > 0".to_string()));
        }
        if self.source.max_source_bytes == 0 {
            return Err(ConfigError::Invalid("source.max_source_bytes must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Worker behavior shared by every element.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PrepareConfig {
    /// Upper bound on a single element's preparation. Unset means no deadline.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: Option<u64>,
    #[serde(default = "default_encoding")]
    pub default_encoding: String,
    #[serde(default = "default_dot_density")]
    pub default_dot_density: u32,
}

impl Default for PrepareConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            default_encoding: default_encoding(),
            default_dot_density: default_dot_density(),
        }
    }
}

/// Layout metrics for rich-text surfaces, in points.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RtfConfig {
    #[serde(default = "default_page_width_pt")]
    pub page_width_pt: f32,
    #[serde(default = "default_font_size_pt")]
    pub default_font_size_pt: f32,
}

impl Default for RtfConfig {
    fn default() -> Self {
        Self {
            page_width_pt: default_page_width_pt(),
            default_font_size_pt: default_font_size_pt(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Relative locators are resolved against this directory.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    #[serde(default = "default_max_source_bytes")]
    pub max_source_bytes: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            max_source_bytes: default_max_source_bytes(),
        }
    }
}

fn default_timeout_ms() -> Option<u64> { Some(30_000) }
fn default_encoding() -> String { "utf-8".to_string() }
fn default_dot_density() -> u32 { 32 }
// 8in printable width at 72pt/in
fn default_page_width_pt() -> f32 { 576.0 }
fn default_font_size_pt() -> f32 { 12.0 }
fn default_base_dir() -> PathBuf { PathBuf::from(".") }
fn default_max_source_bytes() -> u64 { 64 * 1024 * 1024 }

pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path, e);
            return Err(ConfigError::Io(e));
        }
    };
    let config: Config = match toml::from_str(&contents) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to parse config TOML: {}", e);
            return Err(ConfigError::Toml(e));
        }
    };
    config.validate()?;
    Ok(config)
}
