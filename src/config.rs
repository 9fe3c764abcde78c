//! Engine configuration, persisted as TOML.
//!
//! ```toml
//! [ontology]
//! prefix = "http://odahub.io/ontology#"
//! source = "ontology.ttl"     # bundled ontology when absent
//! enabled = true
//!
//! [reconcile]
//! fallback_type = "str"
//!
//! [notebook]
//! notebook_uri = "http://odahub.io/ontology#ThisNotebook"
//! ```

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::namespace::{Namespaces, ODA_NS};
use crate::notebook::NotebookOptions;
use crate::value::PyType;

/// Errors from configuration handling.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(nbonto::config::read),
        help("Ensure the config file exists and is valid TOML.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}: {message}")]
    #[diagnostic(
        code(nbonto::config::parse),
        help("Check the TOML syntax and the section names ([ontology], [reconcile], [notebook]).")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(nbonto::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub ontology: OntologyConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    #[serde(default)]
    pub notebook: NotebookConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OntologyConfig {
    /// Namespace bound to `oda:`.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Turtle file to load instead of the bundled ontology.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    /// `false` runs without a knowledge base.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_prefix() -> String {
    ODA_NS.into()
}
fn default_enabled() -> bool {
    true
}

impl Default for OntologyConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            source: None,
            enabled: default_enabled(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Type for `None` defaults with no other type information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_type: Option<PyType>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotebookConfig {
    /// Subject for notebook-level annotations; `{prefix}ThisNotebook` when
    /// unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notebook_uri: Option<String>,
}

impl EngineConfig {
    /// Parse a TOML document.
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<inline>".into(),
            message: e.to_string(),
        })
    }

    /// Load from a TOML file. A relative `ontology.source` is taken relative
    /// to the config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let resolved = match (&config.ontology.source, path.parent()) {
            (Some(source), Some(dir)) if source.is_relative() => Some(dir.join(source)),
            _ => None,
        };
        if resolved.is_some() {
            config.ontology.source = resolved;
        }
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    pub fn namespaces(&self) -> Namespaces {
        Namespaces::new(self.ontology.prefix.as_str())
    }

    pub fn notebook_uri(&self) -> String {
        self.notebook
            .notebook_uri
            .clone()
            .unwrap_or_else(|| format!("{}ThisNotebook", self.ontology.prefix))
    }

    pub fn notebook_options(&self) -> NotebookOptions {
        NotebookOptions::new(self.namespaces(), self.notebook_uri())
    }
}
