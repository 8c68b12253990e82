use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::net::{AddrParseError, SocketAddr};
use std::path::Path;
use tracing::info;
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";

/// Paystack gateway settings. The secret key is mandatory: there is no mock
/// fallback, a deployment without credentials refuses to start.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct PaystackConfig {
    #[validate(length(min = 1, message = "Paystack secret key is required"))]
    pub secret_key: String,

    #[serde(default = "default_paystack_base_url")]
    pub base_url: String,

    /// Default redirect target after hosted checkout; individual initialize
    /// calls may override it.
    #[serde(default)]
    pub callback_url: Option<String>,
}

fn default_paystack_base_url() -> String {
    crate::payments::paystack::DEFAULT_BASE_URL.to_string()
}

#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL
    #[validate(length(min = 1, message = "Database URL is required"))]
    pub database_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment (development, production, test)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// Comma-separated list of allowed CORS origins; unset means permissive
    /// CORS in development only.
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    #[validate]
    pub paystack: PaystackConfig,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl AppConfig {
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Bind address built from the configured host and port.
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// Loads configuration from `config/default.toml`, an environment-specific
/// overlay, and `APP__`-prefixed environment variables, then validates it.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let run_env = env::var("APP_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let mut builder = Config::builder();

    let default_path = Path::new(CONFIG_DIR).join("default");
    builder = builder.add_source(File::with_name(default_path.to_str().unwrap()).required(false));

    let env_path = Path::new(CONFIG_DIR).join(&run_env);
    builder = builder.add_source(File::with_name(env_path.to_str().unwrap()).required(false));

    builder = builder.add_source(Environment::with_prefix("APP").separator("__"));

    let config: AppConfig = builder.build()?.try_deserialize()?;

    config
        .validate()
        .map_err(|e| ConfigError::Message(format!("invalid configuration: {e}")))?;

    info!(environment = %config.environment, "configuration loaded");
    Ok(config)
}

/// Initializes the global tracing subscriber. `RUST_LOG` overrides the
/// configured level.
pub fn init_tracing(log_level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if json {
        fmt().with_env_filter(filter).json().init();
    } else {
        fmt().with_env_filter(filter).init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/farmstand".into(),
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            cors_allowed_origins: None,
            paystack: PaystackConfig {
                secret_key: "sk_test_abc".into(),
                base_url: default_paystack_base_url(),
                callback_url: None,
            },
        }
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn missing_paystack_secret_fails_validation() {
        let mut config = valid_config();
        config.paystack.secret_key = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn socket_addr_uses_configured_host_and_port() {
        let mut config = valid_config();
        config.host = "127.0.0.1".into();
        config.port = 9090;
        assert_eq!(
            config.socket_addr().unwrap(),
            "127.0.0.1:9090".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn socket_addr_rejects_unparseable_host() {
        let mut config = valid_config();
        config.host = "not a host".into();
        assert!(config.socket_addr().is_err());
    }

    #[test]
    fn missing_database_url_fails_validation() {
        let mut config = valid_config();
        config.database_url = String::new();
        assert!(config.validate().is_err());
    }
}
