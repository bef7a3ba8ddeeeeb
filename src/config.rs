//! Configuration management for the transfer scanner.
//!
//! Supports loading from environment variables and TOML config files, with
//! environment variables taking precedence over file settings.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Helius API key
    pub helius_api_key: String,

    /// Base URL for the Helius REST API
    #[serde(default = "default_helius_url")]
    pub helius_base_url: String,

    /// Finality level requested for returned chain data
    #[serde(default)]
    pub commitment: Commitment,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limits: RateLimitConfig,

    /// Scan limits
    #[serde(default)]
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Commitment::Confirmed => "confirmed",
            Commitment::Finalized => "finalized",
        }
    }
}

impl std::fmt::Display for Commitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Commitment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "confirmed" => Ok(Commitment::Confirmed),
            "finalized" => Ok(Commitment::Finalized),
            other => anyhow::bail!("unknown commitment level: {}", other),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per second
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,

    /// Per-request HTTP timeout (seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rps(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Upper bound on transactions fetched per address
    #[serde(default = "default_max_transactions")]
    pub max_transactions_per_address: usize,

    /// Capacity of the token metadata LRU cache
    #[serde(default = "default_token_cache_capacity")]
    pub token_cache_capacity: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_transactions_per_address: default_max_transactions(),
            token_cache_capacity: default_token_cache_capacity(),
        }
    }
}

// Default value functions
fn default_helius_url() -> String {
    "https://api.helius.xyz/v0".to_string()
}

fn default_rps() -> u32 {
    10 // Free tier
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_transactions() -> usize {
    1000
}

fn default_token_cache_capacity() -> usize {
    1024
}

impl ScannerConfig {
    /// Build a configuration with defaults for everything but the key.
    pub fn with_api_key(helius_api_key: impl Into<String>) -> Self {
        Self {
            helius_api_key: helius_api_key.into(),
            helius_base_url: default_helius_url(),
            commitment: Commitment::default(),
            rate_limits: RateLimitConfig::default(),
            scan: ScanConfig::default(),
        }
    }

    /// Load configuration from the environment (and `.env`, if present)
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let helius_api_key = std::env::var("HELIUS_API_KEY")
            .map_err(|_| anyhow::anyhow!("HELIUS_API_KEY environment variable not set"))?;

        let mut config = Self::with_api_key(helius_api_key);
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load from a TOML config file with environment overrides
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&contents)?;
        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Parse a TOML document without consulting the environment
    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        Ok(::toml::from_str(contents)?)
    }

    fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        if let Ok(key) = std::env::var("HELIUS_API_KEY") {
            self.helius_api_key = key;
        }
        if let Ok(url) = std::env::var("HELIUS_BASE_URL") {
            self.helius_base_url = url;
        }
        if let Ok(level) = std::env::var("HELIUS_COMMITMENT") {
            self.commitment = level.parse()?;
        }
        Ok(())
    }

    /// Validate settings that would otherwise fail deep inside a scan
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.helius_api_key.trim().is_empty() {
            anyhow::bail!("helius_api_key must not be empty");
        }
        if self.rate_limits.requests_per_second == 0 {
            anyhow::bail!("requests_per_second must be > 0");
        }
        if self.scan.token_cache_capacity == 0 {
            anyhow::bail!("token_cache_capacity must be > 0");
        }
        Ok(())
    }
}
