//! Configuration file handling.
//!
//! Settings come from an optional `feedback.toml`. Every section has
//! defaults, so an empty or missing file is valid.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::criteria::{CriterionRegistry, DEFAULT_CRITERIA};

pub const DEFAULT_CONFIG_FILE: &str = "feedback.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub criteria: CriteriaConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Rating criteria for the current reporting period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriteriaConfig {
    #[serde(default = "default_criteria")]
    pub names: Vec<String>,
}

impl Default for CriteriaConfig {
    fn default() -> Self {
        Self {
            names: default_criteria(),
        }
    }
}

fn default_criteria() -> Vec<String> {
    DEFAULT_CRITERIA.iter().map(|name| name.to_string()).collect()
}

/// Report rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Overall averages below this get a follow-up note.
    #[serde(default = "default_low_rating_threshold")]
    pub low_rating_threshold: f64,

    /// Default output path for the report command.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            low_rating_threshold: default_low_rating_threshold(),
            output: default_output(),
        }
    }
}

fn default_low_rating_threshold() -> f64 {
    3.0
}

fn default_output() -> String {
    "report.md".to_string()
}

/// Connection pool settings. The URL itself always comes from `DATABASE_URL`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load an explicit config path, or `feedback.toml` if one exists, or defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }

        let fallback = Path::new(DEFAULT_CONFIG_FILE);
        if fallback.exists() {
            tracing::debug!("using {}", fallback.display());
            return Self::load_from_file(fallback);
        }

        Ok(Self::default())
    }

    pub fn registry(&self) -> Result<CriterionRegistry> {
        CriterionRegistry::new(self.criteria.names.iter().cloned())
            .context("invalid [criteria] section")
    }

    pub fn default_toml() -> String {
        let body = toml::to_string_pretty(&Self::default()).unwrap_or_default();
        format!("# Faculty feedback settings\n\n{body}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.criteria.names, default_criteria());
        assert_eq!(config.report.low_rating_threshold, 3.0);
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn loads_custom_criteria_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[criteria]\nnames = [\"Subject Knowledge\", \"Communication\"]\n\n[report]\nlow_rating_threshold = 2.5"
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        let registry = config.registry().unwrap();
        assert_eq!(registry.names(), &["Subject Knowledge", "Communication"]);
        assert_eq!(config.report.low_rating_threshold, 2.5);
        assert_eq!(config.report.output, "report.md");
    }

    #[test]
    fn duplicate_criteria_fail_registry_construction() {
        let config: Config =
            toml::from_str("[criteria]\nnames = [\"Clarity\", \"Clarity\"]").unwrap();
        assert!(config.registry().is_err());
    }

    #[test]
    fn default_toml_round_trips() {
        let config: Config = toml::from_str(&Config::default_toml()).unwrap();
        assert_eq!(config.criteria.names.len(), 4);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(Config::load(Some(Path::new("/nonexistent/feedback.toml"))).is_err());
    }
}
