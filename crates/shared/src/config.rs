//! Application configuration management.

use std::time::Duration;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Bearer token configuration.
    pub jwt: JwtSettings,
    /// Ledger engine tuning.
    #[serde(default)]
    pub ledger: LedgerConfig,
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

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    5
}

/// Secrets used to verify bearer tokens.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    /// Secret for user-facing access tokens (shared with the identity service).
    pub secret: String,
    /// Secret for service-to-service tokens on `/internal` routes.
    pub internal_secret: String,
}

/// Ledger engine tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Deadline for one locked unit of work, in milliseconds.
    pub unit_of_work_timeout_ms: u64,
    /// Longest wait for a row or advisory lock before the attempt is retried.
    pub lock_timeout_ms: u64,
    /// Extra attempts after a transient store failure.
    pub max_retries: u32,
    /// Base delay between attempts, multiplied by the attempt number.
    pub retry_backoff_ms: u64,
    /// Lifetime of an idempotency record, in seconds.
    pub idempotency_ttl_secs: u64,
    /// Page size used when the caller does not provide one.
    pub default_page_size: u64,
    /// Largest page size a caller may request.
    pub max_page_size: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            unit_of_work_timeout_ms: 10_000,
            lock_timeout_ms: 2_000,
            max_retries: 3,
            retry_backoff_ms: 25,
            idempotency_ttl_secs: 24 * 60 * 60,
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl LedgerConfig {
    /// Deadline for one locked unit of work.
    #[must_use]
    pub const fn unit_of_work_timeout(&self) -> Duration {
        Duration::from_millis(self.unit_of_work_timeout_ms)
    }

    /// Lock wait applied inside the unit of work, never above its deadline.
    #[must_use]
    pub fn effective_lock_timeout_ms(&self) -> u64 {
        self.lock_timeout_ms.min(self.unit_of_work_timeout_ms)
    }

    /// Delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(u64::from(attempt)))
    }

    /// How long an idempotency record stays eligible for replay.
    #[must_use]
    pub fn idempotency_ttl(&self) -> chrono::Duration {
        i64::try_from(self.idempotency_ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }

    /// Rejects settings the locked unit of work cannot run with.
    ///
    /// Postgres treats a zero `statement_timeout` or `lock_timeout` as
    /// "no limit", so zero is refused rather than passed through.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` naming the offending field.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.unit_of_work_timeout_ms == 0 {
            return Err(invalid("ledger.unit_of_work_timeout_ms must be greater than 0"));
        }
        if self.lock_timeout_ms == 0 {
            return Err(invalid("ledger.lock_timeout_ms must be greater than 0"));
        }
        if self.max_page_size == 0 {
            return Err(invalid("ledger.max_page_size must be greater than 0"));
        }
        if self.default_page_size == 0 || self.default_page_size > self.max_page_size {
            return Err(invalid(
                "ledger.default_page_size must be between 1 and ledger.max_page_size",
            ));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> config::ConfigError {
    config::ConfigError::Message(message.to_string())
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, lowest priority first: `config/default`, `config/{RUN_MODE}`,
    /// then `WALLET__*` environment variables (e.g. `WALLET__DATABASE__URL`).
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or fails validation.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("WALLET")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.ledger.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_defaults() {
        let ledger = LedgerConfig::default();
        assert_eq!(ledger.unit_of_work_timeout(), Duration::from_secs(10));
        assert_eq!(ledger.effective_lock_timeout_ms(), 2_000);
        assert!(ledger.validate().is_ok());
        assert_eq!(ledger.idempotency_ttl(), chrono::Duration::hours(24));
        assert_eq!(ledger.default_page_size, 20);
        assert_eq!(ledger.max_page_size, 100);
    }

    #[test]
    fn test_retry_backoff_grows_linearly() {
        let ledger = LedgerConfig {
            retry_backoff_ms: 10,
            ..LedgerConfig::default()
        };
        assert_eq!(ledger.retry_backoff(1), Duration::from_millis(10));
        assert_eq!(ledger.retry_backoff(3), Duration::from_millis(30));
    }

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("WALLET__DATABASE__URL", Some("postgres://localhost/wallet_test")),
                ("WALLET__JWT__SECRET", Some("user-secret")),
                ("WALLET__JWT__INTERNAL_SECRET", Some("internal-secret")),
                ("WALLET__LEDGER__MAX_RETRIES", Some("5")),
                ("WALLET__SERVER__PORT", Some("4100")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/wallet_test");
                assert_eq!(config.database.max_connections, 10);
                assert_eq!(config.jwt.secret, "user-secret");
                assert_eq!(config.jwt.internal_secret, "internal-secret");
                assert_eq!(config.ledger.max_retries, 5);
                assert_eq!(config.ledger.unit_of_work_timeout_ms, 10_000);
                assert_eq!(config.server.port, 4100);
                assert_eq!(config.server.host, "0.0.0.0");
            },
        );
    }

    #[test]
    fn test_load_requires_database_url() {
        temp_env::with_vars(
            [
                ("WALLET__DATABASE__URL", None::<&str>),
                ("WALLET__JWT__SECRET", Some("user-secret")),
                ("WALLET__JWT__INTERNAL_SECRET", Some("internal-secret")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }

    #[test]
    fn test_lock_timeout_capped_by_deadline() {
        let ledger = LedgerConfig {
            unit_of_work_timeout_ms: 500,
            lock_timeout_ms: 2_000,
            ..LedgerConfig::default()
        };
        assert_eq!(ledger.effective_lock_timeout_ms(), 500);
    }

    #[test]
    fn test_validate_rejects_unusable_settings() {
        let cases = [
            LedgerConfig {
                unit_of_work_timeout_ms: 0,
                ..LedgerConfig::default()
            },
            LedgerConfig {
                lock_timeout_ms: 0,
                ..LedgerConfig::default()
            },
            LedgerConfig {
                max_page_size: 0,
                ..LedgerConfig::default()
            },
            LedgerConfig {
                default_page_size: 101,
                ..LedgerConfig::default()
            },
        ];
        for ledger in cases {
            assert!(ledger.validate().is_err(), "{ledger:?}");
        }
    }

    #[test]
    fn test_load_rejects_zero_unit_of_work_timeout() {
        temp_env::with_vars(
            [
                ("WALLET__DATABASE__URL", Some("postgres://localhost/wallet_test")),
                ("WALLET__JWT__SECRET", Some("user-secret")),
                ("WALLET__JWT__INTERNAL_SECRET", Some("internal-secret")),
                ("WALLET__LEDGER__UNIT_OF_WORK_TIMEOUT_MS", Some("0")),
            ],
            || {
                let err = AppConfig::load().unwrap_err();
                assert!(err.to_string().contains("unit_of_work_timeout_ms"), "{err}");
            },
        );
    }
}
