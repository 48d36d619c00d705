use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::segment::CodeDelimiters;

/// Compiler settings, usually read from a `latte.toml` file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Opening host-code delimiter.
    pub code_open: String,
    /// Closing host-code delimiter.
    pub code_close: String,

    /// Content type in effect at the start of every template.
    pub content_type: String,

    /// Salt seed. Each template's salt is derived from the seed and the
    /// template's name; a random salt is generated per compile when unset.
    pub salt: Option<String>,

    /// Extra macros registered on top of the default table: name → pattern.
    pub macros: IndexMap<String, String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        let delimiters = CodeDelimiters::default();
        CompilerConfig {
            code_open: delimiters.open,
            code_close: delimiters.close,
            content_type: "html".to_string(),
            salt: None,
            macros: IndexMap::new(),
        }
    }
}

impl CompilerConfig {
    pub fn from_toml(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&source).map_err(|source| ConfigError::Toml {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn delimiters(&self) -> CodeDelimiters {
        CodeDelimiters {
            open: self.code_open.clone(),
            close: self.code_close.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid configuration in '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}
