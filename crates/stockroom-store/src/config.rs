//! # Store Configuration
//!
//! Configuration management for the storage layer.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKROOM_DATA_DIR=/var/lib/stockroom                              │
//! │     STOCKROOM_BREACH_CHECK=false                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/stockroom/stockroom.toml (Linux)                         │
//! │     ~/Library/Application Support/com.stockroom.stockroom/... (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     platform data dir, breach check on, 5 s timeout                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # stockroom.toml
//! [storage]
//! data_dir = "/var/lib/stockroom"
//!
//! [security]
//! breach_check = true
//! breach_check_url = "https://api.pwnedpasswords.com/range/"
//! breach_timeout_ms = 5000
//!
//! [orders]
//! cancel_policy = "pending_or_validated"  # or "pending_only"
//!
//! [reports]
//! top_products = 5
//! page_size = 10
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use stockroom_core::{CancelPolicy, DEFAULT_PAGE_SIZE, DEFAULT_TOP_PRODUCTS};

use crate::error::{StoreError, StoreResult};

// =============================================================================
// Storage Settings
// =============================================================================

/// Where the tables live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Directory holding every table, the audit log and the commit journal.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "stockroom", "stockroom")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./data"))
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            data_dir: default_data_dir(),
        }
    }
}

// =============================================================================
// Security Settings
// =============================================================================

/// Breached-password check settings.
///
/// The check is advisory: an unreachable or slow service never blocks
/// registration, it only produces a warning in the log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecuritySettings {
    /// Run the breach check during registration.
    #[serde(default = "default_true")]
    pub breach_check: bool,

    /// Range endpoint; the 5-character hash prefix is appended to it.
    #[serde(default = "default_breach_url")]
    pub breach_check_url: String,

    /// Upper bound for one breach check (milliseconds).
    #[serde(default = "default_breach_timeout")]
    pub breach_timeout_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_breach_url() -> String {
    "https://api.pwnedpasswords.com/range/".to_string()
}

fn default_breach_timeout() -> u64 {
    5000
}

impl Default for SecuritySettings {
    fn default() -> Self {
        SecuritySettings {
            breach_check: true,
            breach_check_url: default_breach_url(),
            breach_timeout_ms: default_breach_timeout(),
        }
    }
}

// =============================================================================
// Order and Report Settings
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderSettings {
    #[serde(default)]
    pub cancel_policy: CancelPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSettings {
    /// Length of the top-seller ranking.
    #[serde(default = "default_top_products")]
    pub top_products: usize,

    /// Default page size for product listings.
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_top_products() -> usize {
    DEFAULT_TOP_PRODUCTS
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for ReportSettings {
    fn default() -> Self {
        ReportSettings {
            top_products: default_top_products(),
            page_size: default_page_size(),
        }
    }
}

// =============================================================================
// Main Store Configuration
// =============================================================================

/// Complete store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub security: SecuritySettings,

    #[serde(default)]
    pub orders: OrderSettings,

    #[serde(default)]
    pub reports: ReportSettings,
}

impl StoreConfig {
    /// Default configuration rooted at `data_dir`.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let dir = tempfile::tempdir()?;
    /// let store = Store::open(StoreConfig::with_data_dir(dir.path())).await?;
    /// ```
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.storage.data_dir = data_dir.into();
        config
    }

    /// Disables the breach check.
    pub fn without_breach_check(mut self) -> Self {
        self.security.breach_check = false;
        self
    }

    /// Sets the cancellation policy.
    pub fn cancel_policy(mut self, policy: CancelPolicy) -> Self {
        self.orders.cancel_policy = policy;
        self
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (stockroom.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> StoreResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading store config from file");
                config = Self::from_file(&path)?;
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
            warn!("Failed to load store config: {}. Using defaults.", e);
            Self::default()
        })
    }

    fn from_file(path: &Path) -> StoreResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(StoreError::io(path))?;
        Ok(toml::from_str(&contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StoreResult<()> {
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(StoreError::Config("storage.data_dir must not be empty".into()));
        }

        if self.security.breach_check {
            let url = &self.security.breach_check_url;
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(StoreError::Config(format!(
                    "security.breach_check_url must start with http:// or https://, got: {}",
                    url
                )));
            }
        }

        if self.security.breach_timeout_ms == 0 || self.security.breach_timeout_ms > 60_000 {
            return Err(StoreError::Config(
                "security.breach_timeout_ms must be between 1 and 60000".into(),
            ));
        }

        if self.reports.top_products == 0 || self.reports.page_size == 0 {
            return Err(StoreError::Config(
                "reports.top_products and reports.page_size must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup (the process environment in
    /// production, a map in tests).
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("STOCKROOM_DATA_DIR") {
            debug!(data_dir = %dir, "Overriding data dir from environment");
            self.storage.data_dir = PathBuf::from(dir);
        }

        if let Some(flag) = lookup("STOCKROOM_BREACH_CHECK") {
            match flag.to_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => self.security.breach_check = true,
                "0" | "false" | "off" | "no" => self.security.breach_check = false,
                _ => warn!(value = %flag, "Unknown STOCKROOM_BREACH_CHECK value"),
            }
        }

        if let Some(url) = lookup("STOCKROOM_BREACH_CHECK_URL") {
            debug!(url = %url, "Overriding breach check URL from environment");
            self.security.breach_check_url = url;
        }

        if let Some(timeout) = lookup("STOCKROOM_BREACH_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse::<u64>() {
                self.security.breach_timeout_ms = ms;
            }
        }

        if let Some(policy) = lookup("STOCKROOM_CANCEL_POLICY") {
            match policy.parse() {
                Ok(parsed) => self.orders.cancel_policy = parsed,
                Err(_) => warn!(policy = %policy, "Unknown cancel policy in environment"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "stockroom", "stockroom")
            .map(|dirs| dirs.config_dir().join("stockroom.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn data_dir(&self) -> &Path {
        &self.storage.data_dir
    }

    pub fn breach_timeout(&self) -> Duration {
        Duration::from_millis(self.security.breach_timeout_ms)
    }
}
