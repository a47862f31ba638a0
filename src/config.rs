// Runtime configuration for the desk's outward-facing collaborators.
// Every struct has working defaults; `AppConfig::from_env` overlays FLIGHT_DESK_* variables.

use std::{collections::HashMap, env, str::FromStr};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required setting: {0}")]
    Missing(String),
}

#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub weather: WeatherConfig,
    // Mail delivery is optional, without it reports go to the console
    pub mail: Option<MailConfig>,
}

#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_ms: u64,
    pub retry_config: RetryConfig,
    pub circuit_breaker_config: CircuitBreakerConfig,
    pub cache_config: CacheConfig,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.seniverse.com".to_string(),
            api_key: String::new(),
            timeout_ms: 5000,
            retry_config: RetryConfig::default(),
            circuit_breaker_config: CircuitBreakerConfig::default(),
            cache_config: CacheConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub reset_timeout_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 1,
            reset_timeout_ms: 30000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl_seconds: u64,
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 600,
            max_entries: 64,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
    pub recipients: Vec<String>,
    pub subject: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(env::vars().collect())
    }

    // Split out from from_env so tests do not have to touch the process environment
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();
        let weather = &mut config.weather;

        if let Some(url) = vars.get("FLIGHT_DESK_WEATHER_URL") {
            weather.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(key) = vars.get("FLIGHT_DESK_WEATHER_KEY") {
            weather.api_key = key.clone();
        }
        if let Some(v) = parse_var(&vars, "FLIGHT_DESK_WEATHER_TIMEOUT_MS")? {
            weather.timeout_ms = v;
        }
        if let Some(v) = parse_var(&vars, "FLIGHT_DESK_WEATHER_MAX_RETRIES")? {
            weather.retry_config.max_retries = v;
        }
        if let Some(v) = parse_var(&vars, "FLIGHT_DESK_WEATHER_CACHE_TTL_SECS")? {
            weather.cache_config.ttl_seconds = v;
        }
        if let Some(v) = parse_var(&vars, "FLIGHT_DESK_BREAKER_FAILURES")? {
            weather.circuit_breaker_config.failure_threshold = v;
        }
        if let Some(v) = parse_var(&vars, "FLIGHT_DESK_BREAKER_RESET_MS")? {
            weather.circuit_breaker_config.reset_timeout_ms = v;
        }

        if let Some(server) = vars.get("FLIGHT_DESK_SMTP_SERVER") {
            let required = |key: &str| {
                vars.get(key)
                    .cloned()
                    .ok_or_else(|| ConfigError::Missing(key.to_string()))
            };
            let from_email = required("FLIGHT_DESK_SMTP_FROM")?;
            let recipients: Vec<String> = required("FLIGHT_DESK_SMTP_TO")?
                .split(',')
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect();
            if recipients.is_empty() {
                return Err(ConfigError::Missing("FLIGHT_DESK_SMTP_TO".to_string()));
            }

            config.mail = Some(MailConfig {
                smtp_server: server.clone(),
                smtp_port: parse_var(&vars, "FLIGHT_DESK_SMTP_PORT")?.unwrap_or(465),
                username: vars
                    .get("FLIGHT_DESK_SMTP_USER")
                    .cloned()
                    .unwrap_or_else(|| from_email.clone()),
                password: required("FLIGHT_DESK_SMTP_PASSWORD")?,
                from_name: vars
                    .get("FLIGHT_DESK_SMTP_FROM_NAME")
                    .cloned()
                    .unwrap_or_else(|| "Flight Desk".to_string()),
                from_email,
                recipients,
                subject: "Flight and passenger information.".to_string(),
            });
        }

        Ok(config)
    }
}

fn parse_var<T: FromStr>(vars: &HashMap<String, String>, key: &str) -> Result<Option<T>, ConfigError> {
    match vars.get(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: value.clone(),
            }),
    }
}
