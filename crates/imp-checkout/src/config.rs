//! # Checkout Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     IMP_DATABASE_PATH=/var/lib/imp/imp.db                              │
//! │     IMP_VAT_RATE_BPS=2000                                              │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/imp-checkout/checkout.toml (Linux)                       │
//! │     ~/Library/Application Support/com.imp.checkout/checkout.toml       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # checkout.toml
//! [database]
//! path = "./imp.db"
//! max_connections = 8
//! busy_timeout_secs = 5
//!
//! [pricing]
//! vat_rate_bps = 2000            # 20%
//! first_order_discount_bps = 500 # 5%
//!
//! [order_number]
//! prefix = "IMP"
//! max_number_attempts = 5
//!
//! [retry]
//! max_attempts = 5
//! initial_backoff_ms = 20
//! max_backoff_ms = 500
//! transaction_timeout_secs = 10
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{CheckoutError, CheckoutResult};
use imp_core::{
    TaxRate, DEFAULT_FIRST_ORDER_DISCOUNT_BPS, DEFAULT_ORDER_PREFIX, DEFAULT_VAT_RATE_BPS,
};
use imp_db::DbConfig;

/// Basis points in 100%.
const FULL_RATE_BPS: u32 = 10_000;

// =============================================================================
// Database Settings
// =============================================================================

/// Where orders are stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite database file.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// How long a writer waits for the SQLite write lock (seconds).
    /// Zero fails immediately with a busy error.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_secs: u64,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./imp.db")
}

fn default_max_connections() -> u32 {
    8
}

fn default_busy_timeout() -> u64 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_database_path(),
            max_connections: default_max_connections(),
            busy_timeout_secs: default_busy_timeout(),
        }
    }
}

// =============================================================================
// Pricing Settings
// =============================================================================

/// Rates applied when totalling an order, in basis points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingSettings {
    /// VAT contained in catalog prices (2000 = 20%).
    #[serde(default = "default_vat_rate")]
    pub vat_rate_bps: u32,

    /// Discount for a customer's first order (500 = 5%).
    #[serde(default = "default_first_order_discount")]
    pub first_order_discount_bps: u32,
}

fn default_vat_rate() -> u32 {
    DEFAULT_VAT_RATE_BPS
}

fn default_first_order_discount() -> u32 {
    DEFAULT_FIRST_ORDER_DISCOUNT_BPS
}

impl Default for PricingSettings {
    fn default() -> Self {
        PricingSettings {
            vat_rate_bps: default_vat_rate(),
            first_order_discount_bps: default_first_order_discount(),
        }
    }
}

// =============================================================================
// Order Number Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderNumberSettings {
    /// Leading segment of every order number.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Counter advances allowed within one transaction when a formatted
    /// number is already taken.
    #[serde(default = "default_max_number_attempts")]
    pub max_number_attempts: u32,
}

fn default_prefix() -> String {
    DEFAULT_ORDER_PREFIX.to_string()
}

fn default_max_number_attempts() -> u32 {
    5
}

impl Default for OrderNumberSettings {
    fn default() -> Self {
        OrderNumberSettings {
            prefix: default_prefix(),
            max_number_attempts: default_max_number_attempts(),
        }
    }
}

// =============================================================================
// Retry Settings
// =============================================================================

/// Bounds on re-running a placement after a transient failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Total attempts per placement, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,

    /// Upper bound on one attempt, from BEGIN to COMMIT.
    #[serde(default = "default_transaction_timeout")]
    pub transaction_timeout_secs: u64,
}

fn default_max_attempts() -> u32 {
    5
}
fn default_initial_backoff() -> u64 {
    20
}
fn default_max_backoff() -> u64 {
    500
}
fn default_transaction_timeout() -> u64 {
    10
}

impl Default for RetrySettings {
    fn default() -> Self {
        RetrySettings {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
            transaction_timeout_secs: default_transaction_timeout(),
        }
    }
}

// =============================================================================
// Main Checkout Configuration
// =============================================================================

/// Complete checkout configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub order_number: OrderNumberSettings,

    #[serde(default)]
    pub retry: RetrySettings,
}

impl CheckoutConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (checkout.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> CheckoutResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading checkout config from file");
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
            warn!("Failed to load checkout config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Parses a TOML file without applying overrides.
    pub fn from_file(path: &Path) -> CheckoutResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CheckoutError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses TOML text; missing keys take their defaults.
    pub fn from_toml_str(contents: &str) -> CheckoutResult<Self> {
        toml::from_str(contents).map_err(|e| CheckoutError::Config(e.to_string()))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CheckoutResult<()> {
        if self.database.max_connections == 0 {
            return Err(invalid("database.max_connections must be greater than 0"));
        }

        if self.pricing.vat_rate_bps > FULL_RATE_BPS {
            return Err(invalid("pricing.vat_rate_bps must be at most 10000"));
        }
        if self.pricing.first_order_discount_bps > FULL_RATE_BPS {
            return Err(invalid(
                "pricing.first_order_discount_bps must be at most 10000",
            ));
        }

        let prefix = &self.order_number.prefix;
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CheckoutError::Config(format!(
                "order_number.prefix must be non-empty ASCII letters or digits, got: '{}'",
                prefix
            )));
        }
        if self.order_number.max_number_attempts == 0 {
            return Err(invalid(
                "order_number.max_number_attempts must be greater than 0",
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(invalid("retry.max_attempts must be greater than 0"));
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(invalid(
                "retry.initial_backoff_ms must not exceed retry.max_backoff_ms",
            ));
        }
        if self.retry.transaction_timeout_secs == 0 {
            return Err(invalid(
                "retry.transaction_timeout_secs must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("IMP_DATABASE_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(max) = var("IMP_MAX_CONNECTIONS") {
            match max.parse::<u32>() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %max, "Ignoring invalid IMP_MAX_CONNECTIONS"),
            }
        }

        if let Some(rate) = var("IMP_VAT_RATE_BPS") {
            match rate.parse::<u32>() {
                Ok(bps) => {
                    debug!(bps, "Overriding VAT rate from environment");
                    self.pricing.vat_rate_bps = bps;
                }
                Err(_) => warn!(value = %rate, "Ignoring invalid IMP_VAT_RATE_BPS"),
            }
        }

        if let Some(rate) = var("IMP_FIRST_ORDER_DISCOUNT_BPS") {
            match rate.parse::<u32>() {
                Ok(bps) => self.pricing.first_order_discount_bps = bps,
                Err(_) => warn!(value = %rate, "Ignoring invalid IMP_FIRST_ORDER_DISCOUNT_BPS"),
            }
        }

        if let Some(prefix) = var("IMP_ORDER_PREFIX") {
            debug!(prefix = %prefix, "Overriding order prefix from environment");
            self.order_number.prefix = prefix;
        }

        if let Some(attempts) = var("IMP_MAX_ATTEMPTS") {
            match attempts.parse::<u32>() {
                Ok(n) => self.retry.max_attempts = n,
                Err(_) => warn!(value = %attempts, "Ignoring invalid IMP_MAX_ATTEMPTS"),
            }
        }

        if let Some(secs) = var("IMP_TRANSACTION_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(n) => self.retry.transaction_timeout_secs = n,
                Err(_) => warn!(value = %secs, "Ignoring invalid IMP_TRANSACTION_TIMEOUT_SECS"),
            }
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "imp", "checkout")
            .map(|dirs| dirs.config_dir().join("checkout.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Pool settings for [`imp_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database.path.clone())
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_secs(self.database.busy_timeout_secs))
    }

    pub fn vat_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.pricing.vat_rate_bps)
    }

    pub fn first_order_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.pricing.first_order_discount_bps)
    }

    pub fn transaction_timeout(&self) -> Duration {
        Duration::from_secs(self.retry.transaction_timeout_secs)
    }
}

fn invalid(message: &str) -> CheckoutError {
    CheckoutError::Config(message.to_string())
}
