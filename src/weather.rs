// Weather lookup for the cities the desk flies to. Responses come from a
// Seniverse-compatible daily forecast endpoint and are cached per city; transient
// failures are retried with exponential backoff and jitter behind a circuit breaker.

use std::{fmt, time::Duration};

use bytes::Bytes;
use futures::future::join_all;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    circuit_breaker::{BreakerState, CircuitBreaker},
    config::{RetryConfig, WeatherConfig},
    forecast_cache::{CacheStats, ForecastCache},
    reference::City,
};

pub const DAILY_PATH: &str = "/v3/weather/daily.json";

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("Weather API error: {status_code} - {message}")]
    Status { status_code: u16, message: String },

    #[error("Could not decode weather response: {0}")]
    Decode(String),

    #[error("Weather service unavailable, retry in {retry_after_ms}ms")]
    CircuitOpen { retry_after_ms: u64 },

    #[error("No weather information for {0} was found")]
    NoForecast(City),
}

impl WeatherError {
    pub fn is_retryable(&self) -> bool {
        match self {
            WeatherError::Network(_) | WeatherError::Timeout(_) => true,
            WeatherError::Status { status_code, .. } => *status_code >= 500 || *status_code == 429,
            _ => false,
        }
    }
}

// Wire format of the daily endpoint. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WeatherModel {
    pub results: Vec<WeatherResult>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WeatherResult {
    pub location: WeatherLocation,
    pub daily: Vec<DailyForecast>,
    pub last_update: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WeatherLocation {
    pub id: String,
    pub name: String,
    pub country: String,
    pub path: String,
    pub timezone: String,
    pub timezone_offset: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DailyForecast {
    pub date: String,
    pub text_day: String,
    pub code_day: String,
    pub text_night: String,
    pub code_night: String,
    pub high: String,
    pub low: String,
    pub rainfall: String,
    pub precip: String,
    pub wind_direction: String,
    pub wind_direction_degree: String,
    pub wind_speed: String,
    pub wind_scale: String,
    pub humidity: String,
}

#[derive(Debug, Clone)]
pub struct CityForecast {
    pub city: City,
    pub location_name: String,
    pub last_update: String,
    pub days: Vec<DailyForecast>,
}

impl fmt::Display for CityForecast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "City: {}", self.location_name)?;
        for day in &self.days {
            writeln!(f, "Date: {}", day.date)?;
            writeln!(f, "Daytime weather: {}", day.text_day)?;
            writeln!(f, "Night weather: {}", day.text_night)?;
            writeln!(f, "The highest temperature: {}°C", day.high)?;
            writeln!(f, "The lowest temperature: {}°C", day.low)?;
            writeln!(f, "Wind direction: {}", day.wind_direction)?;
            writeln!(f, "Wind speed: {} km/h", day.wind_speed)?;
            writeln!(f, "Moisture content: {}%", day.humidity)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

pub fn parse_forecast(city: City, body: &[u8]) -> Result<CityForecast, WeatherError> {
    let model: WeatherModel =
        serde_json::from_slice(body).map_err(|e| WeatherError::Decode(e.to_string()))?;
    let result = model
        .results
        .into_iter()
        .next()
        .ok_or(WeatherError::NoForecast(city))?;

    let location_name = if result.location.name.is_empty() {
        city.name().to_string()
    } else {
        result.location.name
    };
    Ok(CityForecast {
        city,
        location_name,
        last_update: result.last_update,
        days: result.daily,
    })
}

// Exponential backoff with jitter to keep retries from lining up
pub fn calculate_backoff(retry_attempt: u32, config: &RetryConfig) -> Duration {
    let base_backoff_ms = (config.initial_backoff_ms as f64
        * config.backoff_multiplier.powf(retry_attempt as f64))
    .min(config.max_backoff_ms as f64);

    let jitter = rand::random::<f64>() * config.jitter_factor * base_backoff_ms;
    let backoff_ms = base_backoff_ms * (1.0 - config.jitter_factor / 2.0) + jitter;

    Duration::from_millis(backoff_ms as u64)
}

pub struct WeatherClient {
    http: reqwest::Client,
    config: WeatherConfig,
    cache: ForecastCache,
    breaker: Mutex<CircuitBreaker>,
}

impl WeatherClient {
    pub fn new(config: WeatherConfig) -> Result<Self, WeatherError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| WeatherError::Network(e.to_string()))?;

        Ok(Self {
            http,
            cache: ForecastCache::new(config.cache_config.clone()),
            breaker: Mutex::new(CircuitBreaker::new(&config.circuit_breaker_config)),
            config,
        })
    }

    pub async fn forecast(&self, city: City) -> Result<CityForecast, WeatherError> {
        if let Some(body) = self.cache.get(city) {
            debug!(city = %city, "forecast served from cache");
            return parse_forecast(city, &body);
        }

        let body = self.fetch_with_retry(city).await?;
        // only cache bodies that actually decode
        let forecast = parse_forecast(city, &body)?;
        self.cache.store(city, body, None);

        info!(city = %city, days = forecast.days.len(), "forecast fetched");
        Ok(forecast)
    }

    // All cities at once, in City::ALL order
    pub async fn forecast_all(&self) -> Vec<(City, Result<CityForecast, WeatherError>)> {
        join_all(
            City::ALL
                .iter()
                .map(|city| async move { (*city, self.forecast(*city).await) }),
        )
        .await
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn breaker_state(&self) -> BreakerState {
        self.breaker.lock().state()
    }

    pub fn reset_circuit_breaker(&self) {
        self.breaker.lock().reset();
    }

    async fn fetch_with_retry(&self, city: City) -> Result<Bytes, WeatherError> {
        let retry_config = &self.config.retry_config;
        let mut attempt = 0;

        loop {
            {
                let mut breaker = self.breaker.lock();
                if !breaker.should_allow_call() {
                    let retry_after_ms = breaker
                        .retry_after()
                        .map(|d| d.as_millis() as u64)
                        .unwrap_or_default();
                    return Err(WeatherError::CircuitOpen { retry_after_ms });
                }
            }

            match self.fetch_once(city).await {
                Ok(body) => {
                    self.breaker.lock().success();
                    return Ok(body);
                }
                Err(e) if e.is_retryable() => {
                    self.breaker.lock().fail();
                    if attempt >= retry_config.max_retries {
                        return Err(e);
                    }
                    let backoff = calculate_backoff(attempt, retry_config);
                    warn!(city = %city, attempt, error = %e, ?backoff, "weather request failed, retrying");
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self, city: City) -> Result<Bytes, WeatherError> {
        let url = format!("{}{}", self.config.base_url, DAILY_PATH);
        let response = self
            .http
            .get(&url)
            .query(&[("key", self.config.api_key.as_str()), ("location", city.name())])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(WeatherError::Status {
                status_code: status.as_u16(),
                message,
            });
        }

        response.bytes().await.map_err(|e| self.transport_error(e))
    }

    fn transport_error(&self, e: reqwest::Error) -> WeatherError {
        if e.is_timeout() {
            WeatherError::Timeout(self.config.timeout_ms)
        } else {
            WeatherError::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheConfig, CircuitBreakerConfig};
    use tokio_test::{assert_err, assert_ok};
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    const BEIJING_DAILY: &str = r#"{
        "results": [{
            "location": {
                "id": "WX4FBXXFKE4F",
                "name": "北京",
                "country": "CN",
                "path": "北京,北京,中国",
                "timezone": "Asia/Shanghai",
                "timezone_offset": "+08:00"
            },
            "daily": [{
                "date": "2025-06-01",
                "text_day": "Sunny",
                "code_day": "0",
                "text_night": "Clear",
                "code_night": "1",
                "high": "31",
                "low": "19",
                "rainfall": "0.00",
                "precip": "0.00",
                "wind_direction": "S",
                "wind_direction_degree": "180",
                "wind_speed": "8.4",
                "wind_scale": "2",
                "humidity": "38"
            }],
            "last_update": "2025-06-01T08:00:00+08:00"
        }]
    }"#;

    fn config(base_url: String, max_retries: u32, failure_threshold: u32) -> WeatherConfig {
        WeatherConfig {
            base_url,
            api_key: "test-key".to_string(),
            timeout_ms: 2000,
            retry_config: RetryConfig {
                max_retries,
                initial_backoff_ms: 1,
                max_backoff_ms: 5,
                backoff_multiplier: 2.0,
                jitter_factor: 0.1,
            },
            circuit_breaker_config: CircuitBreakerConfig {
                failure_threshold,
                success_threshold: 1,
                reset_timeout_ms: 60_000,
            },
            cache_config: CacheConfig::default(),
        }
    }

    #[test]
    fn test_parse_forecast_fills_missing_fields() {
        let forecast = parse_forecast(
            City::Wuxi,
            br#"{"results":[{"location":{},"daily":[{"date":"2025-06-01","high":"30"}]}]}"#,
        )
        .unwrap();

        assert_eq!(forecast.location_name, "Wuxi");
        assert_eq!(forecast.days[0].high, "30");
        assert_eq!(forecast.days[0].humidity, "");
        assert!(forecast.to_string().contains("The highest temperature: 30°C"));

        assert!(matches!(
            parse_forecast(City::Wuxi, br#"{"results":[]}"#),
            Err(WeatherError::NoForecast(City::Wuxi))
        ));
        assert!(matches!(
            parse_forecast(City::Wuxi, b"<html>"),
            Err(WeatherError::Decode(_))
        ));
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let config = RetryConfig {
            jitter_factor: 0.0,
            ..RetryConfig::default()
        };
        assert_eq!(calculate_backoff(0, &config), Duration::from_millis(100));
        assert_eq!(calculate_backoff(2, &config), Duration::from_millis(400));
        assert_eq!(calculate_backoff(20, &config), Duration::from_millis(10000));
    }

    #[tokio::test]
    async fn test_forecast_is_fetched_once_then_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DAILY_PATH))
            .and(query_param("location", "Beijing"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_string(BEIJING_DAILY))
            .expect(1)
            .mount(&server)
            .await;

        let client = WeatherClient::new(config(server.uri(), 0, 5)).unwrap();

        let first = assert_ok!(client.forecast(City::Beijing).await);
        let second = assert_ok!(client.forecast(City::Beijing).await);

        assert_eq!(first.location_name, "北京");
        assert_eq!(first.days.len(), 1);
        assert_eq!(second.days[0].text_day, "Sunny");
        assert_eq!(client.cache_stats().hit_count, 1);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DAILY_PATH))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(DAILY_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(BEIJING_DAILY))
            .expect(1)
            .mount(&server)
            .await;

        let client = WeatherClient::new(config(server.uri(), 3, 5)).unwrap();
        assert_ok!(client.forecast(City::Shanghai).await);
        assert_eq!(client.breaker_state(), BreakerState::Closed);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DAILY_PATH))
            .respond_with(ResponseTemplate::new(403).set_body_string("The API key is invalid."))
            .expect(1)
            .mount(&server)
            .await;

        let client = WeatherClient::new(config(server.uri(), 3, 5)).unwrap();
        let err = assert_err!(client.forecast(City::Nanjing).await);
        assert!(matches!(err, WeatherError::Status { status_code: 403, .. }));
    }

    #[tokio::test]
    async fn test_breaker_opens_and_fails_fast() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DAILY_PATH))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let client = WeatherClient::new(config(server.uri(), 0, 2)).unwrap();
        assert_err!(client.forecast(City::Wuhan).await);
        assert_err!(client.forecast(City::Wuhan).await);
        assert_eq!(client.breaker_state(), BreakerState::Open);

        let err = assert_err!(client.forecast(City::Wuhan).await);
        assert!(matches!(err, WeatherError::CircuitOpen { .. }));

        client.reset_circuit_breaker();
        assert_eq!(client.breaker_state(), BreakerState::Closed);
    }

    #[tokio::test]
    async fn test_forecast_all_reports_per_city() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DAILY_PATH))
            .and(query_param("location", "Chengdu"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"results":[]}"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(DAILY_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(BEIJING_DAILY))
            .mount(&server)
            .await;

        let client = WeatherClient::new(config(server.uri(), 0, 50)).unwrap();
        let results = client.forecast_all().await;

        assert_eq!(results.len(), City::ALL.len());
        for (city, result) in results {
            if city == City::Chengdu {
                assert!(matches!(result, Err(WeatherError::NoForecast(City::Chengdu))));
            } else {
                assert!(result.is_ok(), "{city}");
            }
        }
    }
}
