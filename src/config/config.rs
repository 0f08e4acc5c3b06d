use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// PostgreSQL database connection configuration.
///
/// Used for storing:
/// - Tracked videos with their latest counters
/// - Serialized trend series per metric
#[derive(Debug, Deserialize, Clone)]
pub struct PostgresSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

fn default_pool_size() -> usize {
    4
}

/// Video platform access.
#[derive(Debug, Deserialize, Clone)]
pub struct ScraperSettings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Root used to build canonical video and channel page URLs
    #[serde(default = "default_site_url")]
    pub site_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Pause before every request to the platform
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            site_url: default_site_url(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.bitchute.com/api/beta".to_string()
}

fn default_site_url() -> String {
    "https://www.bitchute.com".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/128.0.0.0 Safari/537.36"
        .to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_request_delay_ms() -> u64 {
    1_000
}

/// Search-driven discovery of new videos.
///
/// Discovery only runs while fewer than `max_videos` videos are tracked;
/// each query contributes at most `per_query_limit` new URLs.
#[derive(Debug, Deserialize, Clone)]
pub struct DiscoverySettings {
    #[serde(default = "default_queries")]
    pub queries: Vec<String>,
    #[serde(default = "default_per_query_limit")]
    pub per_query_limit: usize,
    #[serde(default = "default_max_videos")]
    pub max_videos: usize,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            queries: default_queries(),
            per_query_limit: default_per_query_limit(),
            max_videos: default_max_videos(),
        }
    }
}

fn default_queries() -> Vec<String> {
    ["biden", "trump", "us elections", "kamala"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_per_query_limit() -> usize {
    5
}

fn default_max_videos() -> usize {
    41
}

/// Scrape cycle timing.
#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleSettings {
    #[serde(default = "default_scrape_interval_secs")]
    pub scrape_interval_secs: u64,
    /// Run one cycle immediately instead of waiting a full interval
    #[serde(default = "default_run_on_startup")]
    pub run_on_startup: bool,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            scrape_interval_secs: default_scrape_interval_secs(),
            run_on_startup: default_run_on_startup(),
        }
    }
}

fn default_scrape_interval_secs() -> u64 {
    3_600 // 1 hour, matches the trend bucket size
}

fn default_run_on_startup() -> bool {
    true
}

/// Root application configuration.
///
/// Loaded from `config.yaml` at startup; any key can be overridden with a
/// `TRENDWATCH__SECTION__KEY` environment variable.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub postgres: PostgresSettings,
    #[serde(default)]
    pub scraper: ScraperSettings,
    #[serde(default)]
    pub discovery: DiscoverySettings,
    #[serde(default)]
    pub schedule: ScheduleSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config"))
            .add_source(Environment::with_prefix("TRENDWATCH").separator("__"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_defaults_fill_optional_sections() {
        let yaml = r#"
postgres:
  host: localhost
  port: 5432
  user: trendwatch
  password: secret
  database: trendwatch
"#;
        let settings: Settings = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.postgres.pool_size, 4);
        assert_eq!(settings.discovery.max_videos, 41);
        assert_eq!(settings.discovery.per_query_limit, 5);
        assert_eq!(settings.discovery.queries.len(), 4);
        assert_eq!(settings.schedule.scrape_interval_secs, 3_600);
        assert!(settings.schedule.run_on_startup);
        assert_eq!(settings.scraper.site_url, "https://www.bitchute.com");
    }

    #[test]
    fn test_discovery_overrides() {
        let yaml = r#"
postgres:
  host: db
  port: 5433
  user: u
  password: p
  database: d
discovery:
  queries: ["climate"]
  max_videos: 10
"#;
        let settings: Settings = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.discovery.queries, vec!["climate".to_string()]);
        assert_eq!(settings.discovery.max_videos, 10);
        assert_eq!(settings.discovery.per_query_limit, 5);
        assert_eq!(settings.postgres.port, 5433);
    }
}
