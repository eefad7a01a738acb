use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::RetryPolicy;

pub const DEFAULT_ANALYSIS_URL: &str = "http://localhost:3002/analyze";

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

/// Top-level configuration for the relay and the analysis service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub fetch: FetchConfig,
    pub sink: SinkConfig,
    pub sources: SourceCredentials,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3002".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let fetch = FetchConfig {
            max_attempts: parse_number("FETCH_MAX_ATTEMPTS", 5)?,
            base_delay: Duration::from_millis(parse_number("FETCH_BASE_DELAY_MS", 2000)?),
            max_pages: parse_number("FETCH_MAX_PAGES", 20)?,
            page_limit: parse_number("FETCH_PAGE_LIMIT", 50)?,
            request_timeout: Duration::from_secs(parse_number("HTTP_TIMEOUT_SECS", 30)?),
        };
        if fetch.max_attempts == 0 {
            return Err(ConfigError::InvalidNumber {
                key: "FETCH_MAX_ATTEMPTS",
            });
        }

        let sink = SinkConfig {
            analysis_url: env::var("ANALYSIS_URL")
                .unwrap_or_else(|_| DEFAULT_ANALYSIS_URL.to_string()),
            output_dir: PathBuf::from(
                env::var("RELAY_OUTPUT_DIR").unwrap_or_else(|_| ".".to_string()),
            ),
        };

        let sources = SourceCredentials {
            workable: WorkableSettings {
                subdomain: env::var("WORKABLE_SUBDOMAIN")
                    .unwrap_or_else(|_| "techclub-inc".to_string()),
                api_key: optional("WORKABLE_API_KEY"),
                base_url: optional("WORKABLE_BASE_URL"),
            },
            bamboohr: BambooHrSettings {
                subdomain: env::var("BAMBOOHR_SUBDOMAIN").unwrap_or_else(|_| "sonia".to_string()),
                access_token: optional("ACCESS_TOKEN"),
                base_url: optional("BAMBOOHR_BASE_URL"),
            },
            ceipal: CeipalSettings {
                api_token: optional("CEIPAL_API_TOKEN"),
                base_url: optional("CEIPAL_BASE_URL"),
            },
            recruitee: RecruiteeSettings {
                company_id: env::var("RECRUITEE_COMPANY_ID")
                    .unwrap_or_else(|_| "127297".to_string()),
                api_token: optional("RECRUITEE_API_TOKEN"),
                base_url: optional("RECRUITEE_BASE_URL"),
            },
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            fetch,
            sink,
            sources,
        })
    }
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_number<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
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

/// Upstream request behavior shared by every connector.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_pages: usize,
    pub page_limit: u32,
    pub request_timeout: Duration,
}

impl FetchConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.base_delay)
    }
}

/// Where canonical batches are written and forwarded.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub analysis_url: String,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct SourceCredentials {
    pub workable: WorkableSettings,
    pub bamboohr: BambooHrSettings,
    pub ceipal: CeipalSettings,
    pub recruitee: RecruiteeSettings,
}

#[derive(Debug, Clone, Default)]
pub struct WorkableSettings {
    pub subdomain: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BambooHrSettings {
    pub subdomain: String,
    pub access_token: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CeipalSettings {
    pub api_token: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RecruiteeSettings {
    pub company_id: String,
    pub api_token: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16")]
    InvalidPort,
    #[error("APP_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost { source: std::net::AddrParseError },
    #[error("{key} must be a positive number")]
    InvalidNumber { key: &'static str },
    #[error("{key} is not set; export it or add it to .env")]
    MissingCredential { key: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
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
            "ANALYSIS_URL",
            "RELAY_OUTPUT_DIR",
            "FETCH_MAX_ATTEMPTS",
            "FETCH_BASE_DELAY_MS",
            "FETCH_MAX_PAGES",
            "FETCH_PAGE_LIMIT",
            "HTTP_TIMEOUT_SECS",
            "WORKABLE_SUBDOMAIN",
            "WORKABLE_API_KEY",
            "WORKABLE_BASE_URL",
            "ACCESS_TOKEN",
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
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3002);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.sink.analysis_url, DEFAULT_ANALYSIS_URL);
        assert_eq!(config.fetch.max_attempts, 5);
        assert_eq!(config.fetch.base_delay, Duration::from_secs(2));
        assert_eq!(config.sources.workable.subdomain, "techclub-inc");
        assert!(config.sources.workable.api_key.is_none());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3002));
        env::remove_var("APP_HOST");
    }

    #[test]
    fn rejects_zero_attempts_and_garbage_numbers() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("FETCH_MAX_ATTEMPTS", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidNumber {
                key: "FETCH_MAX_ATTEMPTS"
            })
        ));

        env::set_var("FETCH_MAX_ATTEMPTS", "three");
        assert!(AppConfig::load().is_err());
        env::remove_var("FETCH_MAX_ATTEMPTS");
    }

    #[test]
    fn blank_credentials_are_treated_as_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("WORKABLE_API_KEY", "   ");
        env::set_var("ACCESS_TOKEN", "token-123");
        let config = AppConfig::load().expect("config loads");
        assert!(config.sources.workable.api_key.is_none());
        assert_eq!(
            config.sources.bamboohr.access_token.as_deref(),
            Some("token-123")
        );
        reset_env();
    }
}
