//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::fetch::DEFAULT_USER_AGENT;
use crate::storage::StorageConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Crawler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlSettings {
    /// Seed page: a full URL, or a path resolved against `base_url`
    #[serde(default = "default_seed")]
    pub seed: String,

    /// Origin used to resolve path-like identifiers when the seed is a path
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Stop after this many pages have been collected
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Path prefix of article links
    #[serde(default = "default_article_prefix")]
    pub article_prefix: String,

    /// Element links are collected from; whole page when absent
    #[serde(default = "default_content_selector")]
    pub content_selector: String,

    /// Element holding the page title
    #[serde(default = "default_title_selector")]
    pub title_selector: String,

    /// Extension of stored pages
    #[serde(default = "default_page_extension")]
    pub page_extension: String,

    /// Save a checkpoint every N collected pages
    #[serde(default = "default_checkpoint_every")]
    pub checkpoint_every: usize,

    /// Maximum pending frontier entries
    #[serde(default = "default_frontier_limit")]
    pub frontier_limit: usize,

    /// Politeness delay range between fetches, in milliseconds
    #[serde(default = "default_politeness_min_ms")]
    pub politeness_min_ms: u64,

    #[serde(default = "default_politeness_max_ms")]
    pub politeness_max_ms: u64,

    /// Wait after an HTTP 429 before retrying the same page
    #[serde(default = "default_rate_limit_delay_secs")]
    pub rate_limit_delay_secs: u64,

    /// Give up on a page after this many 429s; unbounded when unset
    #[serde(default)]
    pub max_rate_limit_retries: Option<u32>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_seed() -> String {
    "https://pt.wikipedia.org/wiki/Grammy_Awards".to_string()
}

fn default_base_url() -> String {
    "https://pt.wikipedia.org".to_string()
}

fn default_max_pages() -> usize {
    5000
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_article_prefix() -> String {
    "/wiki/".to_string()
}

fn default_content_selector() -> String {
    "#bodyContent".to_string()
}

fn default_title_selector() -> String {
    ".mw-page-title-main".to_string()
}

fn default_page_extension() -> String {
    "html".to_string()
}

fn default_checkpoint_every() -> usize {
    50
}

fn default_frontier_limit() -> usize {
    1000
}

fn default_politeness_min_ms() -> u64 {
    5000
}

fn default_politeness_max_ms() -> u64 {
    8000
}

fn default_rate_limit_delay_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            base_url: default_base_url(),
            max_pages: default_max_pages(),
            user_agent: default_user_agent(),
            article_prefix: default_article_prefix(),
            content_selector: default_content_selector(),
            title_selector: default_title_selector(),
            page_extension: default_page_extension(),
            checkpoint_every: default_checkpoint_every(),
            frontier_limit: default_frontier_limit(),
            politeness_min_ms: default_politeness_min_ms(),
            politeness_max_ms: default_politeness_max_ms(),
            rate_limit_delay_secs: default_rate_limit_delay_secs(),
            max_rate_limit_retries: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl CrawlSettings {
    pub fn politeness_range(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.politeness_min_ms),
            Duration::from_millis(self.politeness_max_ms),
        )
    }

    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_secs(self.rate_limit_delay_secs)
    }

    /// Set the 429 wait. Only whole seconds are accepted.
    pub fn set_rate_limit_delay(&mut self, delay: Duration) -> Result<(), ConfigError> {
        if delay.subsec_nanos() != 0 {
            return Err(ConfigError::ValidationError(format!(
                "rate limit delay must be a whole number of seconds, got {:?}",
                delay
            )));
        }
        self.rate_limit_delay_secs = delay.as_secs();
        Ok(())
    }
}

/// Fact extraction configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractSettings {
    /// Directory of stored pages; defaults to `<data_dir>/html`
    #[serde(default)]
    pub input_dir: Option<PathBuf>,

    /// Directory for fact records; defaults to `<data_dir>/json`
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Optional JSON report of per-file outcomes
    #[serde(default)]
    pub report_path: Option<PathBuf>,
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log file; defaults to `<data_dir>/logs/main.log`
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    #[serde(default)]
    pub crawl: CrawlSettings,

    #[serde(default)]
    pub extract: ExtractSettings,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            log_file: None,
            crawl: CrawlSettings::default(),
            extract: ExtractSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Storage paths, with the extract output override applied. Crawled pages
    /// always land in `<data_dir>/html`.
    pub fn storage(&self) -> StorageConfig {
        let mut storage = StorageConfig::new(self.data_dir.clone());
        if let Some(dir) = &self.extract.output_dir {
            storage.records_dir = dir.clone();
        }
        storage
    }

    /// Directory the extractor reads pages from.
    pub fn extract_input_dir(&self) -> PathBuf {
        self.extract
            .input_dir
            .clone()
            .unwrap_or_else(|| self.storage().pages_dir)
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| StorageConfig::new(self.data_dir.clone()).logs_dir().join("main.log"))
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let crawl = &self.crawl;

        if crawl.max_pages == 0 {
            return Err(ConfigError::ValidationError(
                "max_pages must be greater than 0".to_string(),
            ));
        }

        if crawl.checkpoint_every == 0 {
            return Err(ConfigError::ValidationError(
                "checkpoint_every must be greater than 0".to_string(),
            ));
        }

        if crawl.frontier_limit == 0 {
            return Err(ConfigError::ValidationError(
                "frontier_limit must be greater than 0".to_string(),
            ));
        }

        if crawl.politeness_min_ms > crawl.politeness_max_ms {
            return Err(ConfigError::ValidationError(format!(
                "politeness_min_ms ({}) exceeds politeness_max_ms ({})",
                crawl.politeness_min_ms, crawl.politeness_max_ms
            )));
        }

        if crawl.article_prefix.is_empty() {
            return Err(ConfigError::ValidationError(
                "article_prefix must not be empty".to_string(),
            ));
        }

        for (name, css) in [
            ("content_selector", &crawl.content_selector),
            ("title_selector", &crawl.title_selector),
        ] {
            if scraper::Selector::parse(css).is_err() {
                return Err(ConfigError::ValidationError(format!(
                    "{} is not a valid CSS selector: {}",
                    name, css
                )));
            }
        }

        if url::Url::parse(&crawl.base_url).is_err() {
            return Err(ConfigError::ValidationError(format!(
                "base_url is not a valid URL: {}",
                crawl.base_url
            )));
        }

        crate::crawl::resolve_seed(&crawl.seed, &crawl.base_url)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.crawl.max_pages, 5000);
        assert_eq!(config.crawl.checkpoint_every, 50);
        assert_eq!(config.crawl.frontier_limit, 1000);
        assert_eq!(config.log_path(), PathBuf::from("./data/logs/main.log"));
    }

    #[test]
    fn test_crawl_settings_delays() {
        let crawl = CrawlSettings::default();

        assert_eq!(
            crawl.politeness_range(),
            (Duration::from_secs(5), Duration::from_secs(8))
        );
        assert_eq!(crawl.rate_limit_delay(), Duration::from_secs(10));
        assert!(crawl.max_rate_limit_retries.is_none());
    }

    #[test]
    fn test_config_validation_ok() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_values() {
        let mut config = AppConfig::default();
        config.crawl.checkpoint_every = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.crawl.politeness_min_ms = 9000;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.crawl.content_selector = "[[".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.crawl.max_pages = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_rejects_bad_seed() {
        let mut config = AppConfig::default();
        config.crawl.seed = "Grammy_Awards".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));

        let mut config = AppConfig::default();
        config.crawl.seed = "mailto:someone@example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.crawl.seed = "/wiki/Grammy_Awards".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rate_limit_delay_whole_seconds_only() {
        let mut crawl = CrawlSettings::default();

        assert!(crawl.set_rate_limit_delay(Duration::from_millis(500)).is_err());
        assert!(crawl.set_rate_limit_delay(Duration::from_millis(1500)).is_err());
        assert_eq!(crawl.rate_limit_delay_secs, 10);

        crawl.set_rate_limit_delay(Duration::from_secs(3)).unwrap();
        assert_eq!(crawl.rate_limit_delay(), Duration::from_secs(3));
    }

    #[test]
    fn test_extract_input_does_not_move_crawl_output() {
        let mut config = AppConfig::default();
        config.extract.input_dir = Some(PathBuf::from("/elsewhere/pages"));

        assert_eq!(config.storage().pages_dir, PathBuf::from("./data/html"));
        assert_eq!(config.extract_input_dir(), PathBuf::from("/elsewhere/pages"));

        config.extract.input_dir = None;
        assert_eq!(config.extract_input_dir(), PathBuf::from("./data/html"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "data_dir = \"/tmp/wiki\"\n\n[crawl]\nmax_pages = 20\nmax_rate_limit_retries = 3\n\n[extract]\noutput_dir = \"/tmp/out\"\n",
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.crawl.max_pages, 20);
        assert_eq!(config.crawl.max_rate_limit_retries, Some(3));
        assert_eq!(config.crawl.article_prefix, "/wiki/");

        let storage = config.storage();
        assert_eq!(storage.pages_dir, PathBuf::from("/tmp/wiki/html"));
        assert_eq!(storage.records_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::load_or_default(&temp_dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.crawl.seed, default_seed());
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();

        // Should be parseable
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.data_dir, parsed.data_dir);
        assert_eq!(config.crawl.user_agent, parsed.crawl.user_agent);
    }
}
