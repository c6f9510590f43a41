mod engine;

pub use engine::EngineConfig;

use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

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
    pub engine: EngineConfig,
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

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            engine: load_engine()?,
        })
    }
}

fn load_engine() -> Result<EngineConfig, ConfigError> {
    let mut engine = EngineConfig::default();

    if let Some(rate) = read_rate("APP_ANNUAL_APPRECIATION")? {
        engine.valuation.annual_appreciation = rate;
    }
    if let Some(rate) = read_rate("APP_MIN_RENTAL_YIELD")? {
        engine.sanity.yield_band.min_yield = rate;
    }
    if let Some(rate) = read_rate("APP_MAX_RENTAL_YIELD")? {
        engine.sanity.yield_band.max_yield = rate;
    }
    if engine.sanity.yield_band.min_yield >= engine.sanity.yield_band.max_yield {
        return Err(ConfigError::InvalidYieldBand {
            min: engine.sanity.yield_band.min_yield,
            max: engine.sanity.yield_band.max_yield,
        });
    }
    if let Some(enabled) = read_flag("APP_GDV_FLOOR")? {
        engine.sanity.gdv_floor.enabled = enabled;
    }

    Ok(engine)
}

fn read_rate(key: &'static str) -> Result<Option<f64>, ConfigError> {
    let Ok(raw) = env::var(key) else {
        return Ok(None);
    };

    match raw.trim().parse::<f64>() {
        Ok(rate) if rate.is_finite() && (0.0..1.0).contains(&rate) => Ok(Some(rate)),
        _ => Err(ConfigError::InvalidRate { key, value: raw }),
    }
}

fn read_flag(key: &'static str) -> Result<Option<bool>, ConfigError> {
    let Ok(raw) = env::var(key) else {
        return Ok(None);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(Some(true)),
        "0" | "false" | "off" | "no" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidFlag { key, value: raw }),
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

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidRate { key: &'static str, value: String },
    InvalidFlag { key: &'static str, value: String },
    InvalidYieldBand { min: f64, max: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidRate { key, value } => {
                write!(f, "{key} must be a fraction between 0 and 1, got '{value}'")
            }
            ConfigError::InvalidFlag { key, value } => {
                write!(f, "{key} must be true or false, got '{value}'")
            }
            ConfigError::InvalidYieldBand { min, max } => {
                write!(
                    f,
                    "minimum rental yield {min} must be below maximum rental yield {max}"
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidRate { .. }
            | ConfigError::InvalidFlag { .. }
            | ConfigError::InvalidYieldBand { .. } => None,
        }
    }
}
