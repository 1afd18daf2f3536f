use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::forms::ProviderId;

const DEFAULT_PROVIDER_ID: &str = "wf-application-form-provider";

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

/// Top-level configuration for the workforce service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub forms: FormsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("WF_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("WF_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("WF_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("WF_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let provider_id = env::var("WF_PROVIDER_ID")
            .ok()
            .map(|value| value.trim().to_string())
            .unwrap_or_else(|| DEFAULT_PROVIDER_ID.to_string());
        if provider_id.is_empty() {
            return Err(ConfigError::EmptyProviderId);
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            forms: FormsConfig {
                provider_id: ProviderId(provider_id),
            },
        })
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

/// Identity of the form provider registered by the service at startup.
#[derive(Debug, Clone)]
pub struct FormsConfig {
    pub provider_id: ProviderId,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    EmptyProviderId,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "WF_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "WF_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::EmptyProviderId => write!(f, "WF_PROVIDER_ID must not be empty"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::EmptyProviderId => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
