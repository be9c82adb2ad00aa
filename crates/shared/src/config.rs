//! Application configuration management.
//!
//! Sources are layered: `config/default.toml`, `config/{RUN_MODE}.toml`,
//! then `TUTORA__SECTION__KEY` environment variables.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Which store backs the repositories.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Caller identity configuration.
    pub auth: AuthConfig,
    /// Slot generation limits.
    #[serde(default)]
    pub scheduling: SchedulingConfig,
    /// Earnings ledger configuration.
    #[serde(default)]
    pub wallet: WalletConfig,
    /// Payout request configuration.
    #[serde(default)]
    pub payout: PayoutConfig,
    /// Payment gateway webhook configuration.
    pub webhook: WebhookConfig,
    /// Background job configuration.
    #[serde(default)]
    pub jobs: JobsConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL. Required when the postgres backend is selected.
    pub url: Option<String>,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Apply pending migrations when the server starts.
    #[serde(default)]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            run_migrations: false,
        }
    }
}

/// Store backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// PostgreSQL through SeaORM.
    #[default]
    Postgres,
    /// Process-local in-memory store (development and tests).
    Memory,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Backend used for all repositories.
    #[serde(default)]
    pub backend: StorageBackend,
}

/// Caller identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret used to verify bearer tokens issued by the auth service.
    pub jwt_secret: String,
}

/// Slot generation limits.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulingConfig {
    /// Largest date range (inclusive days) a slot query may cover.
    #[serde(default = "default_max_range_days")]
    pub max_range_days: u32,
    /// Step between candidate slot starts.
    #[serde(default = "default_slot_granularity_minutes")]
    pub slot_granularity_minutes: u32,
    /// Slots starting sooner than this after "now" are not offered.
    #[serde(default = "default_min_lead_time_minutes")]
    pub min_lead_time_minutes: u32,
}

fn default_max_range_days() -> u32 {
    90
}

fn default_slot_granularity_minutes() -> u32 {
    30
}

fn default_min_lead_time_minutes() -> u32 {
    120
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            max_range_days: default_max_range_days(),
            slot_granularity_minutes: default_slot_granularity_minutes(),
            min_lead_time_minutes: default_min_lead_time_minutes(),
        }
    }
}

/// Earnings ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    /// Delay between lesson completion and funds becoming withdrawable.
    #[serde(default = "default_hold_period_hours")]
    pub hold_period_hours: u32,
    /// Platform commission rates.
    #[serde(default)]
    pub commission: CommissionConfig,
}

fn default_hold_period_hours() -> u32 {
    72
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            hold_period_hours: default_hold_period_hours(),
            commission: CommissionConfig::default(),
        }
    }
}

/// Commission rates as fractions of the lesson price (0.15 = 15%).
///
/// Per-type rates fall back to `default_rate` when unset.
#[derive(Debug, Clone, Deserialize)]
pub struct CommissionConfig {
    /// Rate applied when no per-type rate is configured.
    #[serde(default = "default_commission_rate")]
    pub default_rate: Decimal,
    /// Rate for trial lessons.
    #[serde(default)]
    pub trial_rate: Option<Decimal>,
    /// Rate for single lessons.
    #[serde(default)]
    pub single_rate: Option<Decimal>,
    /// Rate for package lessons.
    #[serde(default)]
    pub package_rate: Option<Decimal>,
}

fn default_commission_rate() -> Decimal {
    Decimal::new(15, 2)
}

impl Default for CommissionConfig {
    fn default() -> Self {
        Self {
            default_rate: default_commission_rate(),
            trial_rate: None,
            single_rate: None,
            package_rate: None,
        }
    }
}

/// Payout request configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PayoutConfig {
    /// Smallest payout a teacher may request, in minor units.
    #[serde(default = "default_min_payout_amount")]
    pub min_amount: i64,
}

fn default_min_payout_amount() -> i64 {
    50_000
}

impl Default for PayoutConfig {
    fn default() -> Self {
        Self {
            min_amount: default_min_payout_amount(),
        }
    }
}

/// Payment gateway webhook configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Shared secret the gateway sends in the `X-Webhook-Secret` header.
    pub secret: String,
}

/// Background job configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    /// Seconds between settlement runs (booking completion, earnings, sweep).
    #[serde(default = "default_settlement_interval_secs")]
    pub settlement_interval_secs: u64,
}

fn default_settlement_interval_secs() -> u64 {
    60
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            settlement_interval_secs: default_settlement_interval_secs(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the sources cannot be read and
    /// `AppError::InvalidConfig` if a loaded value is unusable.
    pub fn load() -> AppResult<Self> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TUTORA").separator("__"))
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that deserialize but cannot run the service.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidConfig` naming the offending key.
    pub fn validate(&self) -> AppResult<()> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(AppError::InvalidConfig("auth.jwt_secret is empty".into()));
        }
        if self.webhook.secret.trim().is_empty() {
            return Err(AppError::InvalidConfig("webhook.secret is empty".into()));
        }
        if self.storage.backend == StorageBackend::Postgres && self.database.url.is_none() {
            return Err(AppError::InvalidConfig(
                "database.url is required for the postgres backend".into(),
            ));
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::InvalidConfig(
                "database.min_connections exceeds database.max_connections".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [(&str, Option<&str>); 3] = [
        ("TUTORA__AUTH__JWT_SECRET", Some("test-secret")),
        ("TUTORA__WEBHOOK__SECRET", Some("hook-secret")),
        ("TUTORA__DATABASE__URL", Some("postgres://localhost/tutora")),
    ];

    #[test]
    fn test_load_applies_defaults() {
        let config = temp_env::with_vars(REQUIRED, AppConfig::load).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert_eq!(config.scheduling.max_range_days, 90);
        assert_eq!(config.scheduling.slot_granularity_minutes, 30);
        assert_eq!(config.wallet.hold_period_hours, 72);
        assert_eq!(config.wallet.commission.default_rate, Decimal::new(15, 2));
        assert_eq!(config.payout.min_amount, 50_000);
        assert_eq!(config.auth.jwt_secret, "test-secret");
    }

    #[test]
    fn test_load_reads_nested_environment() {
        let vars = [
            ("TUTORA__AUTH__JWT_SECRET", Some("test-secret")),
            ("TUTORA__WEBHOOK__SECRET", Some("hook-secret")),
            ("TUTORA__STORAGE__BACKEND", Some("memory")),
            ("TUTORA__PAYOUT__MIN_AMOUNT", Some("10000")),
            ("TUTORA__WALLET__COMMISSION__TRIAL_RATE", Some("0.25")),
        ];
        let config = temp_env::with_vars(vars, AppConfig::load).unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.payout.min_amount, 10_000);
        assert_eq!(config.wallet.commission.trial_rate, Some(Decimal::new(25, 2)));
    }

    #[test]
    fn test_load_requires_secrets() {
        let vars: [(&str, Option<&str>); 2] = [
            ("TUTORA__AUTH__JWT_SECRET", None),
            ("TUTORA__WEBHOOK__SECRET", None),
        ];
        let err = temp_env::with_vars(vars, AppConfig::load).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_load_rejects_blank_secret() {
        let vars = [
            ("TUTORA__AUTH__JWT_SECRET", Some("  ")),
            ("TUTORA__WEBHOOK__SECRET", Some("hook-secret")),
            ("TUTORA__STORAGE__BACKEND", Some("memory")),
        ];
        let err = temp_env::with_vars(vars, AppConfig::load).unwrap_err();

        assert!(matches!(err, AppError::InvalidConfig(ref key) if key.contains("jwt_secret")));
    }

    #[test]
    fn test_postgres_backend_requires_url() {
        let vars = [
            ("TUTORA__AUTH__JWT_SECRET", Some("test-secret")),
            ("TUTORA__WEBHOOK__SECRET", Some("hook-secret")),
            ("TUTORA__DATABASE__URL", None),
        ];
        let err = temp_env::with_vars(vars, AppConfig::load).unwrap_err();

        assert!(matches!(err, AppError::InvalidConfig(ref key) if key.contains("database.url")));
    }
}
