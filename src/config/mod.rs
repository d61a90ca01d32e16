use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, Context};

use crate::core::MatchSettings;
use crate::ontology::{svo_categories, CategorySpec};
use crate::sparql::DEFAULT_SVU_NAMESPACE;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub sparql: SparqlSettings,
    #[serde(default)]
    pub wordnet: WordNetSettings,
    #[serde(default)]
    pub tagger: TaggerSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default = "svo_categories")]
    pub categories: Vec<CategorySpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SparqlSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_attempts")]
    pub attempts: usize,
    #[serde(default = "default_svu_namespace")]
    pub svu_namespace: String,
    /// Turtle or N-Triples dump used instead of the endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_ontology: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordNetSettings {
    #[serde(default = "default_dict_dir")]
    pub dict_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaggerSettings {
    /// Directory holding the averaged perceptron model files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_expansion_category")]
    pub expansion_category: String,
    #[serde(default = "default_phenomenon_class")]
    pub phenomenon_class: String,
}

fn default_name() -> String { "SVO Term Matcher".to_string() }
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }
fn default_endpoint() -> String { "http://sparql.geoscienceontology.org".to_string() }
fn default_timeout() -> u64 { 30 }
fn default_attempts() -> usize { 2 }
fn default_svu_namespace() -> String { DEFAULT_SVU_NAMESPACE.to_string() }
fn default_dict_dir() -> PathBuf { PathBuf::from("wordnet") }
fn default_max_results() -> usize { 5 }
fn default_max_depth() -> usize { 2 }
fn default_expansion_category() -> String { "state".to_string() }
fn default_phenomenon_class() -> String { "Phenomenon".to_string() }

impl Default for ServerSettings {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

impl Default for SparqlSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout: default_timeout(),
            attempts: default_attempts(),
            svu_namespace: default_svu_namespace(),
            local_ontology: None,
        }
    }
}

impl Default for WordNetSettings {
    fn default() -> Self {
        Self { dict_dir: default_dict_dir() }
    }
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            max_depth: default_max_depth(),
            expansion_category: default_expansion_category(),
            phenomenon_class: default_phenomenon_class(),
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            name: default_name(),
            server: ServerSettings::default(),
            sparql: SparqlSettings::default(),
            wordnet: WordNetSettings::default(),
            tagger: TaggerSettings::default(),
            matching: MatchingSettings::default(),
            categories: svo_categories(),
        }
    }
}

impl Configuration {
    /// Load configuration from a YAML or JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid JSON config: {}", path.display()))?
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Invalid YAML config: {}", path.display()))?
        };

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.sparql.local_ontology.is_none() && self.sparql.endpoint.trim().is_empty() {
            anyhow::bail!("No SPARQL endpoint or local ontology defined");
        }

        if self.sparql.attempts == 0 {
            anyhow::bail!("sparql.attempts must be at least 1");
        }

        if self.matching.max_results == 0 {
            anyhow::bail!("matching.max_results must be at least 1");
        }

        if !self.categories.iter().any(|c| c.name == self.matching.expansion_category) {
            anyhow::bail!(
                "Expansion category '{}' is not among the configured categories",
                self.matching.expansion_category
            );
        }

        for category in &self.categories {
            if category.name.is_empty() {
                anyhow::bail!("Category missing name");
            }
        }

        Ok(())
    }

    pub fn match_settings(&self) -> MatchSettings {
        MatchSettings {
            max_results: self.matching.max_results,
            max_depth: self.matching.max_depth,
            attempts: self.sparql.attempts,
            expansion_category: self.matching.expansion_category.clone(),
            phenomenon_class: self.matching.phenomenon_class.clone(),
        }
    }

    /// Create an example configuration
    pub fn example() -> Self {
        Configuration {
            name: "Example SVO Term Matcher".to_string(),
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
            sparql: SparqlSettings {
                endpoint: default_endpoint(),
                timeout: 30,
                attempts: 2,
                svu_namespace: default_svu_namespace(),
                local_ontology: None,
            },
            wordnet: WordNetSettings {
                dict_dir: PathBuf::from("/usr/share/wordnet/dict"),
            },
            tagger: TaggerSettings {
                model_dir: Some(PathBuf::from("models/averaged_perceptron_tagger")),
            },
            matching: MatchingSettings::default(),
            categories: svo_categories(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let config: Configuration = serde_yaml::from_str("name: test\n").unwrap();

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.sparql.endpoint, "http://sparql.geoscienceontology.org");
        assert_eq!(config.sparql.attempts, 2);
        assert_eq!(config.matching.max_results, 5);
        assert_eq!(config.matching.expansion_category, "state");
        assert_eq!(config.categories.len(), 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_example_round_trips_through_yaml() {
        let yaml = serde_yaml::to_string(&Configuration::example()).unwrap();
        let config: Configuration = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(config.name, "Example SVO Term Matcher");
        assert_eq!(config.categories, svo_categories());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"sparql": {{"endpoint": "http://localhost:3030/svo/query", "attempts": 3}},
                "matching": {{"max_depth": 1}}}}"#
        )
        .unwrap();

        let config = Configuration::from_file(file.path()).unwrap();
        assert_eq!(config.sparql.attempts, 3);
        assert_eq!(config.matching.max_depth, 1);
        assert_eq!(config.match_settings().attempts, 3);
    }

    #[test]
    fn test_validation_failures() {
        let mut config = Configuration::default();
        config.sparql.attempts = 0;
        assert!(config.validate().is_err());

        let mut config = Configuration::default();
        config.matching.expansion_category = "mood".to_string();
        assert!(config.validate().is_err());

        let mut config = Configuration::default();
        config.sparql.endpoint = String::new();
        assert!(config.validate().is_err());
        config.sparql.local_ontology = Some(PathBuf::from("svo.ttl"));
        assert!(config.validate().is_ok());
    }
}
