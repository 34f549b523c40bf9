//! Optional generator settings file.
//!
//! ```toml
//! model = "ollama:llama3.1"
//! styles = "styles.json"
//!
//! [overrides]
//! er_entity = "er.entity"
//! edge = "edgeStyle=orthogonalEdgeStyle;rounded=0;"
//! ```
//!
//! Every field is optional; command-line flags take precedence.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::document::StyleOverrides;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub model: Option<String>,
    /// Style library path. Relative paths are taken from the config file's
    /// directory.
    pub styles: Option<PathBuf>,
    pub overrides: StyleOverrides,
}

impl Config {
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml(&content)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?;

        if let (Some(styles), Some(dir)) = (&config.styles, path.parent()) {
            if styles.is_relative() {
                config.styles = Some(dir.join(styles));
            }
        }
        log::debug!(path:? = path; "Loaded config");
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`Error::Config`] on invalid TOML or unknown keys.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("invalid config: {e}")))
    }
}
