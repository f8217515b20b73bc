//! Engine configuration.
//!
//! Defaults overlaid with `MULTISEND_*` environment variables.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Default bound on recipients per batch.
pub const DEFAULT_MAX_RECIPIENTS: usize = 200;

/// Environment variable overriding [`EngineConfig::max_recipients`].
pub const ENV_MAX_RECIPIENTS: &str = "MULTISEND_MAX_RECIPIENTS";

/// Environment variable overriding [`EngineConfig::explorer_base_url`].
pub const ENV_EXPLORER_URL: &str = "MULTISEND_EXPLORER_URL";

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A batch bound of zero would reject every batch.
    #[error("max_recipients must be at least 1")]
    ZeroMaxRecipients,
}

/// Batch executor configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest batch accepted for execution.
    pub max_recipients: usize,
    /// Block explorer base URL used for completion links.
    pub explorer_base_url: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_recipients: DEFAULT_MAX_RECIPIENTS,
            explorer_base_url: None,
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`. Unparsable values are
    /// ignored with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_MAX_RECIPIENTS) {
            match raw.trim().parse::<usize>() {
                Ok(max) => {
                    config.max_recipients = max;
                    info!(max_recipients = max, "Loaded batch bound from environment");
                }
                Err(_) => warn!(value = %raw, "{} is not a number, ignoring", ENV_MAX_RECIPIENTS),
            }
        }

        if let Some(url) = lookup(ENV_EXPLORER_URL) {
            let url = url.trim();
            if url.is_empty() {
                warn!("{} is empty, ignoring", ENV_EXPLORER_URL);
            } else {
                config.explorer_base_url = Some(url.to_string());
            }
        }

        config
    }

    /// Sets the batch bound.
    #[must_use]
    pub fn with_max_recipients(mut self, max: usize) -> Self {
        self.max_recipients = max;
        self
    }

    /// Sets the explorer base URL.
    #[must_use]
    pub fn with_explorer(mut self, url: impl Into<String>) -> Self {
        self.explorer_base_url = Some(url.into());
        self
    }

    /// Rejects configurations no batch could satisfy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_recipients == 0 {
            return Err(ConfigError::ZeroMaxRecipients);
        }
        Ok(())
    }
}
