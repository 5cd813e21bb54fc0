use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants;
use crate::error::{MarketFilterError, Result};
use crate::pipeline::filter::{OutputFieldSet, SourceNames, ThresholdConfig};

/// Everything a run needs. Defaults reproduce the production job, so an empty
/// config file (or none at all) is valid.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sources: SourcesConfig,
    pub thresholds: ThresholdConfig,
    pub output: OutputConfig,
    pub fetch: FetchConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Metadata keys that are never items
    pub reserved_keys: BTreeSet<String>,
    pub primary: SourceConfig,
    pub compare_a: SourceConfig,
    pub compare_b: SourceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Display name, also the prefix of this source's output fields
    pub name: String,
    /// `http(s)://` URL or local file path
    pub url: String,
}

impl SourceConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub output_file: PathBuf,
    pub log_file: PathBuf,
    pub fields: OutputFieldSet,
    /// Number of primary keys echoed into the diagnostic log
    pub sample_size: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout. Unset means a hung source blocks the run.
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub pushgateway_url: Option<String>,
    pub job: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            reserved_keys: constants::RESERVED_KEYS.iter().map(|k| k.to_string()).collect(),
            primary: SourceConfig::new(constants::PRIMARY_SOURCE_NAME, constants::PRIMARY_SOURCE_URL),
            compare_a: SourceConfig::new(constants::COMPARE_A_SOURCE_NAME, constants::COMPARE_A_SOURCE_URL),
            compare_b: SourceConfig::new(constants::COMPARE_B_SOURCE_NAME, constants::COMPARE_B_SOURCE_URL),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_file: PathBuf::from(constants::OUTPUT_FILE),
            log_file: PathBuf::from(constants::LOG_FILE),
            fields: OutputFieldSet::default(),
            sample_size: constants::SAMPLE_KEY_COUNT,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            pushgateway_url: None,
            job: "market_filter".to_string(),
        }
    }
}

impl SourcesConfig {
    /// The three sources in primary, comparison-A, comparison-B order
    pub fn all(&self) -> [&SourceConfig; 3] {
        [&self.primary, &self.compare_a, &self.compare_b]
    }
}

impl Config {
    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            MarketFilterError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        Ok(config)
    }

    /// Load `path` if given, otherwise the default config file if present,
    /// otherwise built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(constants::CONFIG_FILE);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply `MARKET_FILTER_*` environment overrides on top of the file values.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var(constants::ENV_OUTPUT_FILE) {
            self.output.output_file = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var(constants::ENV_LOG_FILE) {
            self.output.log_file = PathBuf::from(path);
        }
        if let Ok(secs) = std::env::var(constants::ENV_FETCH_TIMEOUT_SECS) {
            let secs = secs.trim().parse::<u64>().map_err(|e| {
                MarketFilterError::Config(format!(
                    "{} must be a whole number of seconds: {}",
                    constants::ENV_FETCH_TIMEOUT_SECS,
                    e
                ))
            })?;
            self.fetch.timeout_seconds = Some(secs);
        }
        if let Ok(url) = std::env::var(constants::ENV_PUSHGATEWAY_URL) {
            if !url.trim().is_empty() {
                self.metrics.pushgateway_url = Some(url);
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;

        let mut names = BTreeSet::new();
        for source in self.sources.all() {
            if source.name.trim().is_empty() {
                return Err(MarketFilterError::Config("source name must not be empty".to_string()));
            }
            if source.url.trim().is_empty() {
                return Err(MarketFilterError::Config(format!(
                    "source '{}' has no url",
                    source.name
                )));
            }
            if !names.insert(source.name.as_str()) {
                return Err(MarketFilterError::Config(format!(
                    "source name '{}' is used more than once",
                    source.name
                )));
            }
        }
        if self.fetch.timeout_seconds == Some(0) {
            return Err(MarketFilterError::Config("fetch.timeout_seconds must be positive".to_string()));
        }
        Ok(())
    }

    pub fn source_names(&self) -> SourceNames<'_> {
        SourceNames {
            primary: &self.sources.primary.name,
            compare_a: &self.sources.compare_a.name,
            compare_b: &self.sources.compare_b.name,
        }
    }
}
