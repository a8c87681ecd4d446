use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::scoring::{EligibilityPolicy, RecomputeSettings, ELIGIBILITY_THRESHOLD};

/// Deployment stage; only affects log formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub scoring: ScoringConfig,
    pub recompute: RecomputeConfig,
}

impl AppConfig {
    /// Reads `.env` when present, then `APP_*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::parse(&var_or("APP_ENV", "development"));

        let host = var_or("APP_HOST", "127.0.0.1");
        let port = var_or("APP_PORT", "3000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = var_or("APP_LOG_LEVEL", "info");

        let eligibility_threshold = match env::var("APP_ELIGIBILITY_THRESHOLD") {
            Ok(value) => value
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|threshold| *threshold >= 0)
                .ok_or(ConfigError::InvalidThreshold(value))?,
            Err(_) => ELIGIBILITY_THRESHOLD,
        };

        let batch_size = match env::var("APP_RECOMPUTE_BATCH_SIZE") {
            Ok(value) => value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|size| *size >= 1)
                .ok_or(ConfigError::InvalidBatchSize(value))?,
            Err(_) => RecomputeSettings::default().batch_size,
        };

        let batch_delay_ms = match env::var("APP_RECOMPUTE_BATCH_DELAY_MS") {
            Ok(value) => value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidBatchDelay(value))?,
            Err(_) => 0,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                with_target: environment == AppEnvironment::Development,
            },
            scoring: ScoringConfig {
                eligibility_threshold,
            },
            recompute: RecomputeConfig {
                batch_size,
                batch_delay_ms,
            },
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    /// Include the emitting module in each log line.
    pub with_target: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoringConfig {
    pub eligibility_threshold: i64,
}

impl ScoringConfig {
    pub fn policy(&self) -> EligibilityPolicy {
        EligibilityPolicy::new(self.eligibility_threshold)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RecomputeConfig {
    pub batch_size: usize,
    pub batch_delay_ms: u64,
}

impl RecomputeConfig {
    pub fn settings(&self) -> RecomputeSettings {
        RecomputeSettings {
            batch_size: self.batch_size,
            batch_delay: Duration::from_millis(self.batch_delay_ms),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidThreshold(String),
    InvalidBatchSize(String),
    InvalidBatchDelay(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidThreshold(value) => write!(
                f,
                "APP_ELIGIBILITY_THRESHOLD must be a non-negative integer, got '{value}'"
            ),
            ConfigError::InvalidBatchSize(value) => write!(
                f,
                "APP_RECOMPUTE_BATCH_SIZE must be a positive integer, got '{value}'"
            ),
            ConfigError::InvalidBatchDelay(value) => write!(
                f,
                "APP_RECOMPUTE_BATCH_DELAY_MS must be a whole number of milliseconds, got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_ELIGIBILITY_THRESHOLD",
            "APP_RECOMPUTE_BATCH_SIZE",
            "APP_RECOMPUTE_BATCH_DELAY_MS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.scoring.eligibility_threshold, 400);
        assert_eq!(config.recompute.settings(), RecomputeSettings::default());
    }

    #[test]
    fn reads_scoring_and_recompute_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "production");
        env::set_var("APP_ELIGIBILITY_THRESHOLD", "380");
        env::set_var("APP_RECOMPUTE_BATCH_SIZE", "25");
        env::set_var("APP_RECOMPUTE_BATCH_DELAY_MS", "150");

        let config = AppConfig::load().expect("config loads");

        assert!(!config.telemetry.with_target);
        assert_eq!(config.scoring.policy(), EligibilityPolicy::new(380));
        assert_eq!(config.recompute.settings().batch_size, 25);
        assert_eq!(
            config.recompute.settings().batch_delay,
            Duration::from_millis(150)
        );
        reset_env();
    }

    #[test]
    fn rejects_zero_batch_size() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_RECOMPUTE_BATCH_SIZE", "0");
        let error = AppConfig::load().expect_err("zero batch size is invalid");
        assert!(matches!(error, ConfigError::InvalidBatchSize(ref value) if value == "0"));
        reset_env();
    }

    #[test]
    fn rejects_non_numeric_threshold() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ELIGIBILITY_THRESHOLD", "empat ratus");
        let error = AppConfig::load().expect_err("threshold must be numeric");
        assert!(error.to_string().contains("APP_ELIGIBILITY_THRESHOLD"));
        reset_env();
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }
}
