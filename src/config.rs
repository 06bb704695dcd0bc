//! Configuration file parser for ~/.config/haiyvee/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are accepted but logged, since they are usually typos.
use crate::api::PaginationMode;
use crate::feed::DEFAULT_PAGE_SIZE;
use crate::list::DEFAULT_END_REACHED_THRESHOLD;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Endpoint used when neither the config file nor the CLI names one.
pub const DEFAULT_ENDPOINT: &str = "https://api.loverume.com/api/posts/";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration
// ============================================================================

/// Top-level application configuration.
///
/// Every key is optional; missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Posts endpoint (http or https).
    pub endpoint: String,

    /// Posts requested per page.
    pub page_size: usize,

    /// Fraction of the list that must be on screen before the next page loads.
    pub end_reached_threshold: f32,

    /// Blank lines above the first card.
    pub content_padding_top: u16,

    /// Blank lines below the last card (keeps the footer spinner clear).
    pub content_padding_bottom: u16,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// `"offset"` or `"page"`.
    pub pagination: PaginationMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            end_reached_threshold: DEFAULT_END_REACHED_THRESHOLD,
            content_padding_top: 1,
            content_padding_bottom: 2,
            request_timeout_secs: 30,
            pagination: PaginationMode::Offset,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 7] = [
        "endpoint",
        "page_size",
        "end_reached_threshold",
        "content_padding_top",
        "content_padding_bottom",
        "request_timeout_secs",
        "pagination",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing or empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)`
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), endpoint = %config.endpoint, "Loaded configuration");
        Ok(config)
    }
}
