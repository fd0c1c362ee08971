//! Run configuration.
//!
//! Every option has a built-in default, so an empty (or absent) TOML file
//! reproduces the stock behaviour: weekly refresh of the SHV airspace
//! collection into `./public`, keeping the Meiringen airspaces.

use airspace_data::cache::{DEFAULT_REFRESH_INTERVAL_DAYS, FreshnessGate};
use airspace_data::fetch::DEFAULT_AIRSPACES_URL;
use airspace_filter::{
    DEFAULT_FLAG_PROPERTY, DEFAULT_NAME_PROPERTY, DEFAULT_RELEVANT_AREAS, FilterError,
    RelevanceConfig,
};
use chrono::TimeDelta;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default location of the raw dataset.
pub const DEFAULT_RAW_PATH: &str = "./public/shv_airspaces.json";

/// Default location of the processed dataset.
pub const DEFAULT_PROCESSED_PATH: &str = "./public/shv_airspaces_processed.json";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        /// Path of the config file
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML or has unknown keys
    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    /// Relevant areas are unusable
    #[error(transparent)]
    Relevance(#[from] FilterError),

    /// An option holds an unusable value
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Where the freshness gate reads the last fetch time from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreshnessSource {
    /// Modification time of the raw dataset file.
    #[default]
    ModifiedTime,
    /// Latest entry in the SQLite fetch log.
    FetchLog,
}

/// Options for one refresh-and-filter run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AirspaceConfig {
    /// Endpoint serving the raw GeoJSON collection.
    pub url: String,
    /// Cached raw dataset.
    pub raw_path: PathBuf,
    /// Filtered output consumed by the map front end.
    pub processed_path: PathBuf,
    /// Maximum age of the cached raw dataset, in days.
    pub refresh_interval_days: u32,
    /// Lowercase name substrings selecting the operational area.
    pub relevant_areas: Vec<String>,
    /// Feature property holding the restriction flag.
    pub flag_property: String,
    /// Feature property holding the airspace name.
    pub name_property: String,
    /// Whether `--force` downloads even when the cache is fresh.
    pub force_always_refetches: bool,
    /// Source of the last fetch time.
    pub freshness_source: FreshnessSource,
    /// SQLite fetch log location; the platform cache directory when unset.
    pub fetch_log_path: Option<PathBuf>,
    /// Overall HTTP timeout in seconds; none when unset.
    pub fetch_timeout_secs: Option<u64>,
}

impl Default for AirspaceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_AIRSPACES_URL.to_string(),
            raw_path: PathBuf::from(DEFAULT_RAW_PATH),
            processed_path: PathBuf::from(DEFAULT_PROCESSED_PATH),
            refresh_interval_days: DEFAULT_REFRESH_INTERVAL_DAYS,
            relevant_areas: DEFAULT_RELEVANT_AREAS
                .iter()
                .map(|area| (*area).to_string())
                .collect(),
            flag_property: DEFAULT_FLAG_PROPERTY.to_string(),
            name_property: DEFAULT_NAME_PROPERTY.to_string(),
            force_always_refetches: true,
            freshness_source: FreshnessSource::default(),
            fetch_log_path: None,
            fetch_timeout_secs: None,
        }
    }
}

impl AirspaceConfig {
    /// Load and validate a TOML config file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML config text.
    ///
    /// # Example
    /// ```
    /// use airspace::AirspaceConfig;
    ///
    /// let config = AirspaceConfig::from_toml_str(r#"relevant_areas = ["Sion", "Meiringen"]"#).unwrap();
    /// assert_eq!(config.relevant_areas, ["sion", "meiringen"]);
    /// assert_eq!(config.refresh_interval_days, 7);
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()
    }

    /// Check option values and normalize the relevant areas.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Invalid("url must not be empty".to_string()));
        }
        if self.refresh_interval_days == 0 {
            return Err(ConfigError::Invalid(
                "refresh_interval_days must be at least 1".to_string(),
            ));
        }
        if self.fetch_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "fetch_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.raw_path == self.processed_path {
            return Err(ConfigError::Invalid(format!(
                "raw_path and processed_path must differ (both {:?})",
                self.raw_path
            )));
        }

        self.relevant_areas = RelevanceConfig::new(&self.relevant_areas)?
            .areas()
            .to_vec();
        Ok(self)
    }

    /// Relevance predicate settings.
    pub fn relevance(&self) -> Result<RelevanceConfig, ConfigError> {
        Ok(RelevanceConfig::new(&self.relevant_areas)?
            .with_properties(&self.flag_property, &self.name_property))
    }

    /// Maximum age of the cached raw dataset.
    pub fn refresh_interval(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.refresh_interval_days))
    }

    /// Freshness gate for these options.
    pub fn freshness_gate(&self) -> FreshnessGate {
        FreshnessGate::new(self.refresh_interval(), self.force_always_refetches)
    }

    /// HTTP timeout, if any.
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = AirspaceConfig::from_toml_str("").unwrap();

        assert_eq!(config, AirspaceConfig::default());
        assert_eq!(config.refresh_interval(), TimeDelta::days(7));
        assert_eq!(config.relevant_areas, ["meiringen"]);
        assert_eq!(config.freshness_source, FreshnessSource::ModifiedTime);
        assert!(config.fetch_timeout().is_none());
    }

    #[test]
    fn test_full_config() {
        let config = AirspaceConfig::from_toml_str(
            r#"
            url = "https://example.test/airspaces"
            raw_path = "cache/raw.json"
            processed_path = "site/processed.json"
            refresh_interval_days = 2
            relevant_areas = ["Sion"]
            flag_property = "restricted"
            name_property = "label"
            force_always_refetches = false
            freshness_source = "fetch_log"
            fetch_log_path = "cache/fetch_log.db"
            fetch_timeout_secs = 30
            "#,
        )
        .unwrap();

        assert_eq!(config.url, "https://example.test/airspaces");
        assert_eq!(config.refresh_interval(), TimeDelta::days(2));
        assert_eq!(config.freshness_source, FreshnessSource::FetchLog);
        assert_eq!(config.fetch_timeout(), Some(Duration::from_secs(30)));
        assert!(!config.freshness_gate().force_always_refetches());

        let relevance = config.relevance().unwrap();
        assert_eq!(relevance.areas(), ["sion"]);
        assert_eq!(relevance.flag_property(), "restricted");
        assert_eq!(relevance.name_property(), "label");
    }

    #[rstest]
    #[case("relevant_areas = []")]
    #[case("relevant_areas = [\"  \"]")]
    #[case("refresh_interval_days = 0")]
    #[case("url = \"\"")]
    #[case("fetch_timeout_secs = 0")]
    #[case("raw_path = \"same.json\"\nprocessed_path = \"same.json\"")]
    fn test_invalid_values_rejected(#[case] content: &str) {
        assert!(AirspaceConfig::from_toml_str(content).is_err());
    }

    #[rstest]
    #[case("refresh_days = 3")]
    #[case("freshness_source = \"mtime\"")]
    fn test_unknown_keys_and_variants_rejected(#[case] content: &str) {
        assert!(matches!(
            AirspaceConfig::from_toml_str(content),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AirspaceConfig::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
