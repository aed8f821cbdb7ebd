use super::quote::Fiat;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CoinGeckoProviderConfig {
    #[serde(default = "default_coingecko_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl CoinGeckoProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CoinGeckoProviderConfig {
    fn default() -> Self {
        CoinGeckoProviderConfig {
            base_url: default_coingecko_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub coingecko: CoinGeckoProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Fiat currency selected when the panel starts.
    #[serde(default)]
    pub fiat: Fiat,
    /// Coin pre-filled in the panel.
    #[serde(default = "default_coin")]
    pub coin: String,
    /// How long the fetch control shows "done" before reverting.
    #[serde(default = "default_done_delay_ms")]
    pub done_delay_ms: u64,
}

fn default_coingecko_url() -> String {
    DEFAULT_COINGECKO_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_coin() -> String {
    "bitcoin".to_string()
}

fn default_done_delay_ms() -> u64 {
    1200
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: ProvidersConfig::default(),
            fiat: Fiat::default(),
            coin: default_coin(),
            done_delay_ms: default_done_delay_ms(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, falling back to defaults
    /// when no file has been set up yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "cryptopanel", "cryptopanel")
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

    pub fn done_delay(&self) -> Duration {
        Duration::from_millis(self.done_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
providers:
  coingecko:
    base_url: "http://example.com/cg"
    timeout_secs: 3
fiat: rub
coin: eth
done_delay_ms: 500
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.providers.coingecko.base_url, "http://example.com/cg");
        assert_eq!(config.providers.coingecko.timeout(), Duration::from_secs(3));
        assert_eq!(config.fiat, Fiat::Rub);
        assert_eq!(config.coin, "eth");
        assert_eq!(config.done_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_config_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");
        assert_eq!(config.providers.coingecko.base_url, DEFAULT_COINGECKO_URL);
        assert_eq!(config.providers.coingecko.timeout_secs, 10);
        assert_eq!(config.fiat, Fiat::Usd);
        assert_eq!(config.coin, "bitcoin");
        assert_eq!(config.done_delay_ms, 1200);

        let partial = r#"
providers:
  coingecko:
    timeout_secs: 5
fiat: eur
"#;
        let config: AppConfig = serde_yaml::from_str(partial).unwrap();
        assert_eq!(config.providers.coingecko.base_url, DEFAULT_COINGECKO_URL);
        assert_eq!(config.providers.coingecko.timeout_secs, 5);
        assert_eq!(config.fiat, Fiat::Eur);
    }

    #[test]
    fn test_unknown_fiat_is_rejected() {
        let result: Result<AppConfig, _> = serde_yaml::from_str("fiat: gbp");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_path() -> Result<()> {
        let file = tempfile::NamedTempFile::new()?;
        fs::write(file.path(), "coin: doge\n")?;
        let config = AppConfig::load_from_path(file.path())?;
        assert_eq!(config.coin, "doge");

        let missing = AppConfig::load_from_path(file.path().with_extension("missing"));
        assert!(missing.is_err());
        Ok(())
    }
}
