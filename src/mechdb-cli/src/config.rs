//! Configuration management for mechdb CLI

use anyhow::{Context, Result};
use mechdb::{ClassifierRules, EnrichmentMode, PipelineConfig, DEFAULT_DB_PATH};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Default database path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,

    /// Enrichment mode used by `ingest`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<EnrichmentMode>,

    /// Classifier rule table; built-in rules when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classifier: Option<ClassifierRules>,
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("mechdb");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from file, or default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(())
    }

    /// Database path: explicit flag (or env), then config, then the default
    pub fn database_path(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.database.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH))
    }

    /// Pipeline options, with an optional enrichment override
    pub fn pipeline_config(&self, enrichment: Option<EnrichmentMode>) -> PipelineConfig {
        PipelineConfig {
            classifier: self.classifier.clone().unwrap_or_default(),
            enrichment: enrichment.or(self.enrichment).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_path_exists() {
        let result = Config::config_path();
        assert!(result.is_ok());
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            database: Some(PathBuf::from("/tmp/units.db")),
            enrichment: Some(EnrichmentMode::Skip),
            classifier: Some(ClassifierRules::default()),
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_database_precedence() {
        let config = Config {
            database: Some(PathBuf::from("from-config.db")),
            ..Default::default()
        };
        assert_eq!(
            config.database_path(Some(PathBuf::from("flag.db"))),
            PathBuf::from("flag.db")
        );
        assert_eq!(config.database_path(None), PathBuf::from("from-config.db"));
        assert_eq!(
            Config::default().database_path(None),
            PathBuf::from(DEFAULT_DB_PATH)
        );
    }

    #[test]
    fn test_pipeline_config_override() {
        let config = Config {
            enrichment: Some(EnrichmentMode::Skip),
            ..Default::default()
        };
        assert_eq!(config.pipeline_config(None).enrichment, EnrichmentMode::Skip);
        assert_eq!(
            config.pipeline_config(Some(EnrichmentMode::Enqueue)).enrichment,
            EnrichmentMode::Enqueue
        );
        assert_eq!(config.pipeline_config(None).classifier, ClassifierRules::default());
    }

    #[test]
    fn test_parse_rules_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
database = "units.db"
enrichment = "skip"

[classifier]
empty_sentinels = ["-empty-"]

[[classifier.rules]]
category = "weapon"
match = "word"
patterns = ["laser"]
"#,
        )
        .unwrap();
        let config = Config::load_from(&path).unwrap();
        let rules = config.classifier.unwrap();
        assert_eq!(rules.rules.len(), 1);
        assert_eq!(rules.empty_sentinels, vec!["-empty-"]);
    }
}
