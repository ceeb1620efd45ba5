use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::ingestion::DEFAULT_FEED_URL;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub ingestion: IngestionConfig,
    pub tariffs: TariffConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let enabled =
            parse_flag(&env::var("INGEST_ENABLED").unwrap_or_else(|_| "false".to_string()))?;
        let feed_url =
            env::var("INGEST_FEED_URL").unwrap_or_else(|_| DEFAULT_FEED_URL.to_string());
        let interval_secs = env::var("INGEST_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or(ConfigError::InvalidInterval)?;

        let tariffs = TariffConfig {
            cities_csv: env::var("TARIFF_CITIES_CSV").ok().map(PathBuf::from),
            base_fees_csv: env::var("TARIFF_BASE_FEES_CSV").ok().map(PathBuf::from),
            rules_csv: env::var("TARIFF_RULES_CSV").ok().map(PathBuf::from),
        };
        tariffs.check()?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            ingestion: IngestionConfig {
                enabled,
                feed_url,
                interval: Duration::from_secs(interval_secs),
            },
            tariffs,
        })
    }
}

fn parse_flag(value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            value: value.to_string(),
        }),
    }
}

/// Settings controlling the HTTP server binding.
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Scheduled weather feed polling.
#[derive(Debug, Clone)]
pub struct IngestionConfig {
    pub enabled: bool,
    pub feed_url: String,
    pub interval: Duration,
}

/// Optional CSV overrides for the built-in tariff tables. Either all three are set or none.
#[derive(Debug, Clone, Default)]
pub struct TariffConfig {
    pub cities_csv: Option<PathBuf>,
    pub base_fees_csv: Option<PathBuf>,
    pub rules_csv: Option<PathBuf>,
}

impl TariffConfig {
    fn check(&self) -> Result<(), ConfigError> {
        match (&self.cities_csv, &self.base_fees_csv, &self.rules_csv) {
            (None, None, None) | (Some(_), Some(_), Some(_)) => Ok(()),
            _ => Err(ConfigError::PartialTariffOverride),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidFlag { value: String },
    InvalidInterval,
    PartialTariffOverride,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFlag { value } => {
                write!(f, "INGEST_ENABLED must be true or false, got '{value}'")
            }
            ConfigError::InvalidInterval => {
                write!(f, "INGEST_INTERVAL_SECS must be a positive number of seconds")
            }
            ConfigError::PartialTariffOverride => write!(
                f,
                "TARIFF_CITIES_CSV, TARIFF_BASE_FEES_CSV and TARIFF_RULES_CSV must be set together"
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
