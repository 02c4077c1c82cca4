//! Engine configuration
//!
//! Loaded from the `[invoke]` table of a TOML file:
//!
//! ```toml
//! [invoke]
//! fixed_arity_limit = 16
//! allow_synthesis = true
//! adapter_prefix = "invoka$Adapter"
//! ```
//!
//! Every key is optional. Setting `INVOKA_DISABLE_SYNTHESIS` in the
//! environment turns adapter synthesis off regardless of the file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::table::ARITY_CAP;

/// Environment variable that disables adapter synthesis
pub const DISABLE_SYNTHESIS_ENV: &str = "INVOKA_DISABLE_SYNTHESIS";

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to render TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// A value is out of range
    #[error("Invalid config: {0}")]
    ValidationError(String),
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Highest slot count (parameters plus receiver) routed to the
    /// fixed-arity table. At most [`ARITY_CAP`].
    #[serde(default = "default_fixed_arity_limit")]
    pub fixed_arity_limit: usize,

    /// Whether adapters may be generated at runtime
    #[serde(default = "default_allow_synthesis")]
    pub allow_synthesis: bool,

    /// Prefix of generated adapter names
    #[serde(default = "default_adapter_prefix")]
    pub adapter_prefix: String,
}

fn default_fixed_arity_limit() -> usize {
    ARITY_CAP
}

fn default_allow_synthesis() -> bool {
    true
}

fn default_adapter_prefix() -> String {
    "invoka$Adapter".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fixed_arity_limit: default_fixed_arity_limit(),
            allow_synthesis: default_allow_synthesis(),
            adapter_prefix: default_adapter_prefix(),
        }
    }
}

/// File layout: settings live under `[invoke]`
#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    invoke: EngineConfig,
}

impl EngineConfig {
    /// Load from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        file.invoke.validate()?;
        Ok(file.invoke)
    }

    /// Render as TOML text
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(&ConfigFile {
            invoke: self.clone(),
        })?)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fixed_arity_limit > ARITY_CAP {
            return Err(ConfigError::ValidationError(format!(
                "fixed_arity_limit {} exceeds the table capacity of {}",
                self.fixed_arity_limit, ARITY_CAP
            )));
        }
        if self.adapter_prefix.is_empty() || self.adapter_prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::ValidationError(format!(
                "adapter_prefix must be non-empty and contain no whitespace, got {:?}",
                self.adapter_prefix
            )));
        }
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env(self) -> Self {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    fn apply_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup(DISABLE_SYNTHESIS_ENV) {
            if is_truthy(&value) {
                tracing::debug!(env = DISABLE_SYNTHESIS_ENV, "adapter synthesis disabled by environment");
                self.allow_synthesis = false;
            }
        }
        self
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
