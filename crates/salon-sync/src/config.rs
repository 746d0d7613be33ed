//! # Client Configuration
//!
//! Configuration for the POS terminal's connection to the salon API.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SALON_API_URL=https://api.example.com/v1                           │
//! │     SALON_API_TOKEN=...                                                │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/pos/client.toml (Linux)                                  │
//! │     ~/Library/Application Support/com.salon.pos/client.toml (macOS)    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     localhost API, 15s polling, 18% GST                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # client.toml
//! [terminal]
//! id = "550e8400-e29b-41d4-a716-446655440000"
//! name = "Front Desk"
//!
//! [api]
//! base_url = "https://api.example.com/v1"
//! token = "..."
//! timeout_secs = 15
//! read_retry_secs = 10
//!
//! [polling]
//! active_walk_ins_secs = 15
//!
//! [pricing]
//! default_tax_bps = 1800
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use salon_core::TaxRate;

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Terminal Configuration
// =============================================================================

/// Identity of this POS terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Unique terminal identifier (UUID v4), generated on first run.
    pub id: String,

    /// Human-readable name (e.g., "Front Desk").
    #[serde(default = "default_terminal_name")]
    pub name: String,
}

fn default_terminal_name() -> String {
    "POS Terminal".to_string()
}

impl Default for TerminalConfig {
    fn default() -> Self {
        TerminalConfig {
            id: Uuid::new_v4().to_string(),
            name: default_terminal_name(),
        }
    }
}

// =============================================================================
// API Settings
// =============================================================================

/// Where and how to reach the salon API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL; endpoint paths are joined onto it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token sent with every request.
    #[serde(default)]
    pub token: Option<String>,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// How long idempotent reads keep retrying transient failures
    /// (seconds). 0 disables retries.
    #[serde(default = "default_read_retry")]
    pub read_retry_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_timeout() -> u64 {
    15
}

fn default_read_retry() -> u64 {
    10
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout(),
            read_retry_secs: default_read_retry(),
        }
    }
}

impl ApiSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn read_retry(&self) -> Duration {
        Duration::from_secs(self.read_retry_secs)
    }
}

// =============================================================================
// Polling Settings
// =============================================================================

/// Background refresh intervals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingSettings {
    /// Interval between active walk-in refreshes (seconds).
    #[serde(default = "default_active_walk_ins_interval")]
    pub active_walk_ins_secs: u64,
}

fn default_active_walk_ins_interval() -> u64 {
    15
}

impl Default for PollingSettings {
    fn default() -> Self {
        PollingSettings {
            active_walk_ins_secs: default_active_walk_ins_interval(),
        }
    }
}

impl PollingSettings {
    pub fn active_walk_ins_interval(&self) -> Duration {
        Duration::from_secs(self.active_walk_ins_secs)
    }
}

// =============================================================================
// Pricing Settings
// =============================================================================

/// Pricing defaults applied to lines the server sends back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingSettings {
    /// Tax rate (basis points) for resumed service lines.
    #[serde(default = "default_tax_bps")]
    pub default_tax_bps: u32,
}

fn default_tax_bps() -> u32 {
    TaxRate::STANDARD_GST.bps()
}

impl Default for PricingSettings {
    fn default() -> Self {
        PricingSettings {
            default_tax_bps: default_tax_bps(),
        }
    }
}

impl PricingSettings {
    pub fn default_tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.default_tax_bps)
    }
}

// =============================================================================
// Complete Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub terminal: TerminalConfig,

    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub polling: PollingSettings,

    #[serde(default)]
    pub pricing: PricingSettings,
}

impl ClientConfig {
    /// Creates a new config with defaults and a generated terminal ID.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (client.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load client config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Client config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.terminal.id.trim().is_empty() {
            return Err(SyncError::InvalidConfig("terminal id is required".into()));
        }

        self.api_url()?;

        if self.api.timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.polling.active_walk_ins_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "active_walk_ins_secs must be greater than 0".into(),
            ));
        }

        if self.pricing.default_tax_bps > 10000 {
            return Err(SyncError::InvalidConfig(format!(
                "default_tax_bps must be at most 10000, got {}",
                self.pricing.default_tax_bps
            )));
        }

        Ok(())
    }

    /// Parses the API base URL, requiring http or https.
    pub fn api_url(&self) -> SyncResult<Url> {
        let url = Url::parse(&self.api.base_url)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(SyncError::InvalidUrl(format!(
                "API URL must use http:// or https://, got {}://",
                other
            ))),
        }
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SALON_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Ok(token) = std::env::var("SALON_API_TOKEN") {
            self.api.token = Some(token);
        }

        if let Ok(id) = std::env::var("SALON_TERMINAL_ID") {
            debug!(terminal_id = %id, "Overriding terminal ID from environment");
            self.terminal.id = id;
        }

        if let Ok(secs) = std::env::var("SALON_POLL_INTERVAL_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.polling.active_walk_ins_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring invalid SALON_POLL_INTERVAL_SECS"),
            }
        }

        if let Ok(bps) = std::env::var("SALON_DEFAULT_TAX_BPS") {
            match bps.parse::<u32>() {
                Ok(b) => self.pricing.default_tax_bps = b,
                Err(_) => warn!(value = %bps, "Ignoring invalid SALON_DEFAULT_TAX_BPS"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "salon", "pos")
            .map(|dirs| dirs.config_dir().join("client.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn terminal_id(&self) -> &str {
        &self.terminal.id
    }

    pub fn default_tax_rate(&self) -> TaxRate {
        self.pricing.default_tax_rate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert!(!config.terminal.id.is_empty());
        assert_eq!(config.polling.active_walk_ins_secs, 15);
        assert_eq!(config.default_tax_rate(), TaxRate::STANDARD_GST);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ClientConfig::default();

        config.api.base_url = "ftp://files.example.com".into();
        assert!(matches!(config.validate(), Err(SyncError::InvalidUrl(_))));

        config.api.base_url = "not a url".into();
        assert!(matches!(config.validate(), Err(SyncError::InvalidUrl(_))));

        config.api.base_url = "https://api.example.com/v1".into();
        assert!(config.validate().is_ok());

        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());
        config.api.timeout_secs = 5;

        config.polling.active_walk_ins_secs = 0;
        assert!(config.validate().is_err());
        config.polling.active_walk_ins_secs = 15;

        config.pricing.default_tax_bps = 10001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://pos.example.com/api"

            [pricing]
            default_tax_bps = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://pos.example.com/api");
        assert_eq!(config.api.timeout_secs, 15);
        assert_eq!(config.default_tax_rate().bps(), 500);
        assert_eq!(config.terminal.name, "POS Terminal");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join(format!("salon-config-{}", Uuid::new_v4()));
        let path = dir.join("client.toml");

        let mut config = ClientConfig::default();
        config.terminal.name = "Front Desk".into();
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[terminal]"));
        assert!(contents.contains("[pricing]"));

        let loaded: ClientConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.terminal.name, "Front Desk");
        assert_eq!(loaded.terminal.id, config.terminal.id);

        let _ = std::fs::remove_dir_all(dir);
    }
}
