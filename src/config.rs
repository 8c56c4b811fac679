//! Analytics configuration, persisted as TOML.
//!
//! Every field has a default, so an empty file (or no file) gives the standard
//! behaviour: clustering guard 6..=300, at most 6 clusters, 10 k-means rounds,
//! counting rollup on the heatmap and weighted rollup on the progress view.

use std::path::Path;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cluster::ClusterConfig;
use crate::rollup::RollupFormula;

/// Errors from loading, saving or validating configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(rollup::config::read),
        help("Ensure the config file exists and is valid TOML.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}")]
    #[diagnostic(
        code(rollup::config::parse),
        help("Check the TOML syntax in the config file. {message}")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(rollup::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {message}")]
    #[diagnostic(
        code(rollup::config::invalid),
        help(
            "Clustering needs min_rows >= 2, min_rows <= max_rows, max_k >= 2 \
             and iterations >= 1."
        )
    )]
    Invalid { message: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// On-disk analytics configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Fewest students the heatmap will cluster.
    #[serde(default = "default_min_rows")]
    pub min_rows: usize,
    /// Most students the heatmap will cluster.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
    /// Upper cap on the automatically chosen cluster count.
    #[serde(default = "default_max_k")]
    pub max_k: usize,
    /// k-means rounds per candidate.
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Rollup formula for PI/PLO heatmap columns.
    #[serde(default = "default_heatmap_formula")]
    pub heatmap_formula: RollupFormula,
    /// Rollup formula for the student progress view.
    #[serde(default = "default_progress_formula")]
    pub progress_formula: RollupFormula,
}

fn default_min_rows() -> usize {
    6
}
fn default_max_rows() -> usize {
    300
}
fn default_max_k() -> usize {
    6
}
fn default_iterations() -> usize {
    10
}
fn default_heatmap_formula() -> RollupFormula {
    RollupFormula::Counting
}
fn default_progress_formula() -> RollupFormula {
    RollupFormula::Weighted
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            min_rows: default_min_rows(),
            max_rows: default_max_rows(),
            max_k: default_max_k(),
            iterations: default_iterations(),
            heatmap_formula: default_heatmap_formula(),
            progress_formula: default_progress_formula(),
        }
    }
}

impl AnalyticsConfig {
    /// Parse from a TOML string.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<string>".into(),
            message: e.to_string(),
        })
    }

    /// Load from a TOML file and validate.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = self.to_toml_string()?;
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

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: "<string>".into(),
            message: e.to_string(),
        })
    }

    /// Reject settings that would make clustering meaningless.
    pub fn validate(&self) -> ConfigResult<()> {
        let problem = if self.min_rows < 2 {
            Some(format!("min_rows must be >= 2, got {}", self.min_rows))
        } else if self.min_rows > self.max_rows {
            Some(format!(
                "min_rows ({}) exceeds max_rows ({})",
                self.min_rows, self.max_rows
            ))
        } else if self.max_k < 2 {
            Some(format!("max_k must be >= 2, got {}", self.max_k))
        } else if self.iterations == 0 {
            Some("iterations must be >= 1".to_string())
        } else {
            None
        };
        match problem {
            Some(message) => Err(ConfigError::Invalid { message }),
            None => Ok(()),
        }
    }

    pub fn to_cluster_config(&self) -> ClusterConfig {
        ClusterConfig {
            min_rows: self.min_rows,
            max_rows: self.max_rows,
            max_k: self.max_k,
            iterations: self.iterations,
        }
    }
}
