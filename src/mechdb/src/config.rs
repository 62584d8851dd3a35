//! Pipeline configuration.
//!
//! Everything here deserializes from the `[classifier]` and `enrichment`
//! entries of the CLI config file. Library components take these values
//! through their constructors.

use crate::classify::{Classifier, ClassifierRules};
use crate::repository::RepoResult;
use serde::{Deserialize, Serialize};

/// What the staging writer does about battle-value enrichment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentMode {
    /// Queue one lookup job per staged unit
    Enqueue,
    /// Do nothing
    Skip,
}

impl Default for EnrichmentMode {
    fn default() -> Self {
        Self::Enqueue
    }
}

impl std::fmt::Display for EnrichmentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enqueue => write!(f, "enqueue"),
            Self::Skip => write!(f, "skip"),
        }
    }
}

impl std::str::FromStr for EnrichmentMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "enqueue" => Ok(Self::Enqueue),
            "skip" | "none" | "off" => Ok(Self::Skip),
            _ => Err(format!("Unknown enrichment mode: {}", s)),
        }
    }
}

/// Options shared by every pipeline phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub classifier: ClassifierRules,
    #[serde(default)]
    pub enrichment: EnrichmentMode,
}

impl PipelineConfig {
    /// Compile the configured classifier. Fails on an invalid rule pattern.
    pub fn build_classifier(&self) -> RepoResult<Classifier> {
        Classifier::from_rules(&self.classifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.enrichment, EnrichmentMode::Enqueue);
        let classifier = config.build_classifier().unwrap();
        assert_eq!(classifier.classify("Medium Laser").category, Category::Weapon);
    }

    #[test]
    fn test_partial_toml_keeps_default_rules() {
        let config: PipelineConfig = toml::from_str("enrichment = \"skip\"\n").unwrap();
        assert_eq!(config.enrichment, EnrichmentMode::Skip);
        assert_eq!(config.classifier, ClassifierRules::default());

        let config: PipelineConfig =
            toml::from_str("[classifier]\nempty_sentinels = [\"vacant\"]\n").unwrap();
        let classifier = config.build_classifier().unwrap();
        assert_eq!(classifier.classify("Vacant").category, Category::Empty);
        assert_eq!(classifier.classify("Jump Jet").category, Category::Component);
    }

    #[test]
    fn test_enrichment_mode_parse() {
        assert_eq!("Enqueue".parse::<EnrichmentMode>(), Ok(EnrichmentMode::Enqueue));
        assert_eq!("off".parse::<EnrichmentMode>(), Ok(EnrichmentMode::Skip));
        assert!("sync".parse::<EnrichmentMode>().is_err());
    }
}
