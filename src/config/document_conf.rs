use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error, info, warn};

use crate::config::ConfigError;

/// Settings for document numbering, duplication and list display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Marker prepended to the customer name of a duplicated quote
    pub copy_prefix: String,
    /// Minimum width of the zero-padded monthly sequence
    pub sequence_width: usize,
    /// Scope used in counter keys, e.g. "quotes" -> "quotes-2505"
    pub counter_scope: String,
    /// Rows revealed per "load more" in the list view
    pub list_page_size: usize,
    /// Scroll ratio (0..=1) past which the list view loads another page
    pub scroll_threshold: f64,
    /// Page size of the recent-history feed
    pub history_page_size: usize,
}

fn parse_env<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError> {
    env::var(key)
        .unwrap_or_else(|_| {
            warn!("{} not set, using default: {}", key, default);
            default.to_string()
        })
        .parse::<T>()
        .map_err(|_| {
            error!("Invalid {} value", key);
            ConfigError::InvalidValue(format!("Invalid {} value", key))
        })
}

impl DocumentConfig {
    /// Load document settings from environment variables
    ///
    /// - DOC_COPY_PREFIX (default "[copy] ")
    /// - DOC_SEQUENCE_WIDTH (default 3)
    /// - DOC_COUNTER_SCOPE (default "quotes")
    /// - LIST_PAGE_SIZE (default 20)
    /// - LIST_SCROLL_THRESHOLD (default 0.8)
    /// - HISTORY_PAGE_SIZE (default 10)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading document configuration from environment variables");

        let copy_prefix = env::var("DOC_COPY_PREFIX").unwrap_or_else(|_| "[copy] ".to_string());
        let counter_scope = env::var("DOC_COUNTER_SCOPE").unwrap_or_else(|_| "quotes".to_string());

        let config = DocumentConfig {
            copy_prefix,
            sequence_width: parse_env("DOC_SEQUENCE_WIDTH", "3")?,
            counter_scope,
            list_page_size: parse_env("LIST_PAGE_SIZE", "20")?,
            scroll_threshold: parse_env("LIST_SCROLL_THRESHOLD", "0.8")?,
            history_page_size: parse_env("HISTORY_PAGE_SIZE", "10")?,
        };
        debug!(config = ?config, "Document configuration");

        config.validate()?;
        info!("Document configuration loaded successfully");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.copy_prefix.trim().is_empty() {
            return Err(ConfigError::ValidationError("Copy prefix cannot be empty".to_string()));
        }
        if self.sequence_width == 0 || self.sequence_width > 9 {
            return Err(ConfigError::ValidationError("Sequence width must be between 1 and 9".to_string()));
        }
        if self.counter_scope.is_empty() {
            return Err(ConfigError::ValidationError("Counter scope cannot be empty".to_string()));
        }
        if self.list_page_size == 0 || self.history_page_size == 0 {
            return Err(ConfigError::ValidationError("Page sizes must be greater than 0".to_string()));
        }
        if !(self.scroll_threshold > 0.0 && self.scroll_threshold <= 1.0) {
            return Err(ConfigError::ValidationError("Scroll threshold must be in (0, 1]".to_string()));
        }
        Ok(())
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        DocumentConfig {
            copy_prefix: "[copy] ".to_string(),
            sequence_width: 3,
            counter_scope: "quotes".to_string(),
            list_page_size: 20,
            scroll_threshold: 0.8,
            history_page_size: 10,
        }
    }
}
