//! Configuration management.
//!
//! Values come, in increasing precedence, from built-in defaults (which read
//! `COLLECTION_STATS_API_KEY`, `COLLECTION_STATS_GROUP_ID` and
//! `COLLECTION_STATS_MAX_ITEMS`, or the older `ETH_RC_*` names), an optional
//! TOML file, and `COLLECTION_STATS__<SECTION>__<KEY>` environment variables.
//!
//! ```toml
//! [api]
//! api_key = "..."
//! group_id = "09746"
//! max_items = 150
//! timeout_secs = 30
//!
//! [filter]
//! min_year = 2010
//!
//! [statistics]
//! request_delay_ms = 1000
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::DEFAULT_MAX_ITEMS;
use crate::normalize::DEFAULT_MIN_YEAR;
use crate::sources::{Endpoints, ENTITY_BASE_URL, SEARCH_URL, STATISTICS_URL};
use crate::utils::DEFAULT_TIMEOUT_SECS;

pub const API_KEY_ENV: &str = "COLLECTION_STATS_API_KEY";
pub const GROUP_ID_ENV: &str = "COLLECTION_STATS_GROUP_ID";
pub const MAX_ITEMS_ENV: &str = "COLLECTION_STATS_MAX_ITEMS";

/// Variable names read when the current ones are unset, paired with their replacement
pub const LEGACY_ENV_VARS: &[(&str, &str)] = &[
    ("ETH_RC_API_KEY", API_KEY_ENV),
    ("ETH_RC_GROUP_ID", GROUP_ID_ENV),
    ("ETH_RC_MAX_ITEMS", MAX_ITEMS_ENV),
];

/// Prefix of layered environment overrides (`COLLECTION_STATS__API__GROUP_ID`)
pub const ENV_PREFIX: &str = "COLLECTION_STATS";

pub const DEFAULT_GROUP_ID: &str = "09746";

const CONFIG_FILE_NAME: &str = "collection-stats.toml";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub filter: FilterConfig,

    #[serde(default)]
    pub statistics: StatisticsConfig,
}

/// API access settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API credential; never written back out
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    pub group_id: String,

    pub max_items: usize,

    pub search_url: String,

    pub statistics_url: String,

    pub entity_base_url: String,

    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: env_var(API_KEY_ENV),
            group_id: env_var(GROUP_ID_ENV).unwrap_or_else(|| DEFAULT_GROUP_ID.to_string()),
            max_items: max_items_from(env_var(MAX_ITEMS_ENV)),
            search_url: SEARCH_URL.to_string(),
            statistics_url: STATISTICS_URL.to_string(),
            entity_base_url: ENTITY_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            search_url: self.search_url.clone(),
            statistics_url: self.statistics_url.clone(),
            entity_base_url: self.entity_base_url.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Read a non-blank variable, falling back to its legacy name
pub fn env_var(name: &str) -> Option<String> {
    let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

    read(name).or_else(|| {
        let &(legacy, _) = LEGACY_ENV_VARS.iter().find(|(_, current)| *current == name)?;
        let value = read(legacy)?;
        tracing::warn!("{} is deprecated, use {} instead", legacy, name);
        Some(value)
    })
}

/// Parse a max-items override, falling back to the default when unset or invalid
fn max_items_from(value: Option<String>) -> usize {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_MAX_ITEMS)
}

/// Row filtering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Exclusive lower bound on the publication year
    pub min_year: i32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_year: DEFAULT_MIN_YEAR,
        }
    }
}

/// Usage statistics settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// Minimum spacing between two usage-report requests
    pub request_delay_ms: u64,
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: 1000,
        }
    }
}

impl StatisticsConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

/// Load configuration from a file, with environment overrides
///
/// Overrides stay strings until deserialization, so numeric-looking ids
/// such as `09746` keep their leading zero.
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    settings.try_deserialize()
}

/// Look for a config file in the working directory, then the user config dir
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("collection-stats").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Get the default configuration (from env vars or defaults)
pub fn get_config() -> Config {
    Config::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // load_config reads process-wide overrides
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.filter.min_year, 2010);
        assert_eq!(config.statistics.request_delay(), Duration::from_secs(1));
        assert_eq!(config.api.search_url, SEARCH_URL);
        assert_eq!(config.api.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_max_items_fallback() {
        assert_eq!(max_items_from(None), DEFAULT_MAX_ITEMS);
        assert_eq!(max_items_from(Some("25".to_string())), 25);
        assert_eq!(max_items_from(Some("lots".to_string())), DEFAULT_MAX_ITEMS);
    }

    #[test]
    fn test_load_config_file() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            r#"
[api]
api_key = "file-key"
group_id = "12345"
max_items = 20
search_url = "http://localhost:9999/search"

[filter]
min_year = 2015

[statistics]
request_delay_ms = 250
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.api.api_key.as_deref(), Some("file-key"));
        assert_eq!(config.api.group_id, "12345");
        assert_eq!(config.api.max_items, 20);
        assert_eq!(config.api.endpoints().search_url, "http://localhost:9999/search");
        assert_eq!(config.api.statistics_url, STATISTICS_URL);
        assert_eq!(config.filter.min_year, 2015);
        assert_eq!(config.statistics.request_delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_env_override_keeps_leading_zero() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "[api]\ngroup_id = \"12345\"\n\n[filter]\nmin_year = 2015").unwrap();

        std::env::set_var("COLLECTION_STATS__API__GROUP_ID", "09746");
        std::env::set_var("COLLECTION_STATS__API__MAX_ITEMS", "20");
        let loaded = load_config(file.path());
        std::env::remove_var("COLLECTION_STATS__API__GROUP_ID");
        std::env::remove_var("COLLECTION_STATS__API__MAX_ITEMS");

        let config = loaded.unwrap();
        assert_eq!(config.api.group_id, "09746");
        assert_eq!(config.api.max_items, 20);
        assert_eq!(config.filter.min_year, 2015);
    }

    #[test]
    fn test_legacy_env_var_fallback() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        std::env::remove_var(MAX_ITEMS_ENV);
        std::env::set_var("ETH_RC_MAX_ITEMS", "42");
        let value = env_var(MAX_ITEMS_ENV);
        std::env::remove_var("ETH_RC_MAX_ITEMS");

        assert_eq!(value.as_deref(), Some("42"));
        assert_eq!(env_var("COLLECTION_STATS_UNMAPPED_VARIABLE"), None);
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config(Path::new("/nonexistent/collection-stats.toml")).is_err());
    }

    #[test]
    fn test_api_key_not_serialized() {
        let mut config = Config::default();
        config.api.api_key = Some("secret".to_string());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
