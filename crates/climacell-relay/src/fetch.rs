//! ClimaCell v3 API client.

use async_trait::async_trait;
use serde_json::Value;

use crate::config::RelayConfig;
use crate::error::{RelayError, Result};

/// Field list requested for every forecast kind.
const FIELDS: &str = "temp,feels_like,dewpoint,humidity,wind_speed,wind_direction,\
                      wind_gust,baro_pressure,precipitation,precipitation_type,sunrise,sunset,\
                      visibility,cloud_cover,cloud_base,cloud_ceiling,surface_shortwave_radiation,\
                      moon_phase,weather_code";

/// The two forecast products the relay handles. The kind doubles as the
/// blob category prefix and the publish ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastKind {
    Realtime,
    Hourly,
}

impl ForecastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastKind::Realtime => "realtime",
            ForecastKind::Hourly => "hourly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "realtime" => Some(ForecastKind::Realtime),
            "hourly" => Some(ForecastKind::Hourly),
            _ => None,
        }
    }

    /// Path under the API base URL.
    fn api_path(&self) -> &'static str {
        match self {
            ForecastKind::Realtime => "realtime",
            ForecastKind::Hourly => "forecast/hourly",
        }
    }
}

impl std::fmt::Display for ForecastKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of raw weather payloads. The HTTP layer depends on this seam so
/// tests can substitute canned responses.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// Fetch the raw payload for `kind`. Upstream non-success statuses
    /// surface unchanged as [`RelayError::UpstreamStatus`]; no retries.
    async fn fetch(&self, kind: ForecastKind) -> Result<Value>;
}

/// reqwest-backed ClimaCell client with fixed per-kind query parameters.
pub struct WeatherFetcher {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    latitude: f64,
    longitude: f64,
}

impl WeatherFetcher {
    pub fn new(config: &RelayConfig, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            latitude: config.latitude,
            longitude: config.longitude,
        }
    }

    fn query(&self, kind: ForecastKind) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("lat", self.latitude.to_string()),
            ("lon", self.longitude.to_string()),
            ("unit_system", "si".to_string()),
        ];
        match kind {
            ForecastKind::Realtime => params.push(("fields", FIELDS.to_string())),
            ForecastKind::Hourly => {
                params.push(("start_time", "now".to_string()));
                params.push(("fields", format!("{FIELDS},precipitation_probability")));
            }
        }
        params
    }
}

#[async_trait]
impl ForecastSource for WeatherFetcher {
    async fn fetch(&self, kind: ForecastKind) -> Result<Value> {
        let url = format!("{}/{}", self.api_base, kind.api_path());
        log::debug!("Fetching {kind} forecast from {url}");

        let response = self
            .client
            .get(&url)
            .query(&self.query(kind))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header("apikey", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("Upstream {kind} fetch returned {status}");
            return Err(RelayError::UpstreamStatus(status.as_u16()));
        }

        Ok(response.json::<Value>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_fetcher() -> WeatherFetcher {
        let yaml = r#"
latitude: 43.65
longitude: -79.38
api_base: "https://api.climacell.co/v3/weather/"
"#;
        let config: RelayConfig = serde_yaml::from_str(yaml).unwrap();
        WeatherFetcher::new(&config, "test-key".into())
    }

    #[test]
    fn test_kind_roundtrip() {
        assert_eq!(ForecastKind::parse("realtime"), Some(ForecastKind::Realtime));
        assert_eq!(ForecastKind::parse("hourly"), Some(ForecastKind::Hourly));
        assert_eq!(ForecastKind::parse("daily"), None);
        assert_eq!(ForecastKind::Realtime.as_str(), "realtime");
        assert_eq!(ForecastKind::Hourly.to_string(), "hourly");
    }

    #[test]
    fn test_api_base_trailing_slash_stripped() {
        let fetcher = test_fetcher();
        assert_eq!(fetcher.api_base, "https://api.climacell.co/v3/weather");
    }

    #[test]
    fn test_realtime_query_params() {
        let fetcher = test_fetcher();
        let params = fetcher.query(ForecastKind::Realtime);

        assert!(params.contains(&("lat", "43.65".to_string())));
        assert!(params.contains(&("lon", "-79.38".to_string())));
        assert!(params.contains(&("unit_system", "si".to_string())));

        let fields = &params.iter().find(|(k, _)| *k == "fields").unwrap().1;
        assert!(fields.starts_with("temp,feels_like"));
        assert!(fields.ends_with("weather_code"));
        assert!(!params.iter().any(|(k, _)| *k == "start_time"));
    }

    #[test]
    fn test_hourly_query_params() {
        let fetcher = test_fetcher();
        let params = fetcher.query(ForecastKind::Hourly);

        assert!(params.contains(&("start_time", "now".to_string())));
        let fields = &params.iter().find(|(k, _)| *k == "fields").unwrap().1;
        assert!(fields.ends_with("weather_code,precipitation_probability"));
    }
}
