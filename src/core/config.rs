use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const ALPHA_VANTAGE_KEY_ENV: &str = "ALPHA_VANTAGE_API_KEY";
pub const POLYGON_KEY_ENV: &str = "POLYGON_API_KEY";

pub const ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co";
pub const POLYGON_URL: &str = "https://api.polygon.io";
pub const YAHOO_URL: &str = "https://query1.finance.yahoo.com";

/// Configured key, else the environment variable `env_name`. Blank keys count as missing.
fn resolve_api_key(configured: Option<&String>, env_name: &str) -> Option<String> {
    let usable = |key: &String| !key.trim().is_empty();
    configured
        .cloned()
        .filter(usable)
        .or_else(|| std::env::var(env_name).ok().filter(usable))
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AlphaVantageConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for AlphaVantageConfig {
    fn default() -> Self {
        Self {
            base_url: ALPHA_VANTAGE_URL.to_string(),
            api_key: None,
        }
    }
}

impl AlphaVantageConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_api_key(self.api_key.as_ref(), ALPHA_VANTAGE_KEY_ENV)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PolygonConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for PolygonConfig {
    fn default() -> Self {
        Self {
            base_url: POLYGON_URL.to_string(),
            api_key: None,
        }
    }
}

impl PolygonConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_api_key(self.api_key.as_ref(), POLYGON_KEY_ENV)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

impl Default for YahooProviderConfig {
    fn default() -> Self {
        Self {
            base_url: YAHOO_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct ProvidersConfig {
    pub alpha_vantage: AlphaVantageConfig,
    pub polygon: PolygonConfig,
    pub yahoo: YahooProviderConfig,
}

pub fn default_popular_etfs() -> Vec<String> {
    [
        "VTI", "VOO", "SPY", "QQQ", "ARKK", "VEA", "VWO", "AGG", "VNQ", "GLD",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub providers: ProvidersConfig,
    pub request_timeout_secs: u64,
    pub popular_etfs: Vec<String>,
    pub chart_export_dir: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            providers: ProvidersConfig::default(),
            request_timeout_secs: 10,
            popular_etfs: default_popular_etfs(),
            chart_export_dir: None,
        }
    }
}

impl AppConfig {
    /// Loads the config at the default location, or defaults if none exists there.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "etfdesk", "etfdesk")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
providers:
  alpha_vantage:
    base_url: "http://example.com/av"
    api_key: "demo"
  polygon:
    base_url: "http://example.com/polygon"
request_timeout_secs: 3
popular_etfs: ["SPY", "QQQ"]
chart_export_dir: "/tmp/charts"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(
            config.providers.alpha_vantage.base_url,
            "http://example.com/av"
        );
        assert_eq!(
            config.providers.alpha_vantage.api_key.as_deref(),
            Some("demo")
        );
        assert_eq!(config.providers.polygon.base_url, "http://example.com/polygon");
        assert!(config.providers.polygon.api_key.is_none());
        // yahoo omitted, default kept
        assert_eq!(
            config.providers.yahoo.base_url,
            "https://query1.finance.yahoo.com"
        );
        assert_eq!(config.request_timeout_secs, 3);
        assert_eq!(config.popular_etfs, vec!["SPY", "QQQ"]);
        assert_eq!(config.chart_export_dir.as_deref(), Some("/tmp/charts"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.popular_etfs.len(), 10);
        assert_eq!(config.popular_etfs[0], "VTI");
        assert!(config.chart_export_dir.is_none());
    }

    #[test]
    fn test_configured_api_key_wins() {
        assert_eq!(
            resolve_api_key(Some(&"from-config".to_string()), "ETFDESK_TEST_UNSET_KEY").as_deref(),
            Some("from-config")
        );
        assert!(resolve_api_key(Some(&"  ".to_string()), "ETFDESK_TEST_UNSET_KEY").is_none());
        assert!(resolve_api_key(None, "ETFDESK_TEST_UNSET_KEY").is_none());
    }

    #[test]
    fn test_provider_section_with_only_a_key() {
        let yaml_str = "providers:\n  alpha_vantage:\n    api_key: \"abc\"\n  polygon: {}\n";
        let config: AppConfig = serde_yaml::from_str(yaml_str).unwrap();
        assert_eq!(config.providers.alpha_vantage.base_url, ALPHA_VANTAGE_URL);
        assert_eq!(config.providers.alpha_vantage.api_key.as_deref(), Some("abc"));
        assert_eq!(config.providers.polygon.base_url, POLYGON_URL);
        assert_eq!(config.providers.yahoo.base_url, YAHOO_URL);
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        let result = AppConfig::load_from_path("/definitely/not/here/config.yaml");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to read config file")
        );
    }
}
