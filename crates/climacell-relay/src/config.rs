use serde::Deserialize;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;

use crate::error::{RelayError, Result};
use crate::secrets::SecretSource;

/// Relay configuration, loaded once at startup and passed into each
/// component. No ambient globals.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Query location for the ClimaCell API.
    pub latitude: f64,
    pub longitude: f64,

    /// Zenoh key-expression prefix for published weather payloads.
    /// The forecast kind is appended as the ordering key.
    #[serde(default = "default_topic")]
    pub topic: String,

    /// Port for the HTTP surface.
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Root directory for archived snapshot blobs.
    #[serde(default = "default_archive_dir")]
    pub archive_dir: PathBuf,

    /// Zone timestamps without an explicit offset are interpreted in.
    #[serde(default = "default_source_tz")]
    pub source_tz: String,

    /// Zone all timestamps are converted to before publishing.
    #[serde(default = "default_target_tz")]
    pub target_tz: String,

    /// Maximum seconds to wait for a publish acknowledgment.
    #[serde(default = "default_publish_timeout")]
    pub publish_timeout_secs: u64,

    /// Base URL of the ClimaCell v3 weather API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Where the ClimaCell API key comes from.
    #[serde(default)]
    pub api_key: SecretSource,
}

fn default_topic() -> String {
    "weather/climacell".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from("./archive")
}

fn default_source_tz() -> String {
    "UTC".to_string()
}

fn default_target_tz() -> String {
    "America/Toronto".to_string()
}

fn default_publish_timeout() -> u64 {
    10
}

fn default_api_base() -> String {
    "https://api.climacell.co/v3/weather".to_string()
}

impl RelayConfig {
    /// Load configuration from a YAML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RelayError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| RelayError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Fail early on values that would otherwise only break per request.
    pub fn validate(&self) -> Result<()> {
        self.source_zone()?;
        self.target_zone()?;
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(RelayError::Config(format!(
                "latitude {} out of range",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(RelayError::Config(format!(
                "longitude {} out of range",
                self.longitude
            )));
        }
        Ok(())
    }

    pub fn source_zone(&self) -> Result<Tz> {
        parse_zone(&self.source_tz)
    }

    pub fn target_zone(&self) -> Result<Tz> {
        parse_zone(&self.target_tz)
    }
}

fn parse_zone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| RelayError::Config(format!("unknown timezone '{name}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_minimal_config() {
        let yaml = r#"
latitude: 43.65
longitude: -79.38
"#;
        let config: RelayConfig = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.topic, "weather/climacell");
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.archive_dir, PathBuf::from("./archive"));
        assert_eq!(config.source_tz, "UTC");
        assert_eq!(config.target_tz, "America/Toronto");
        assert_eq!(config.publish_timeout_secs, 10);
        assert_eq!(config.api_base, "https://api.climacell.co/v3/weather");
    }

    #[test]
    fn test_load_full_config() {
        let yaml = r#"
latitude: 45.5
longitude: -73.57
topic: "weather/montreal"
http_port: 9090
archive_dir: "/var/lib/relay/archive"
source_tz: "UTC"
target_tz: "America/Montreal"
publish_timeout_secs: 3
api_base: "http://localhost:8081/v3/weather"
api_key:
  file:
    path: "/run/secrets/climacell"
"#;
        let config: RelayConfig = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.topic, "weather/montreal");
        assert_eq!(config.http_port, 9090);
        assert_eq!(config.publish_timeout_secs, 3);
        assert!(matches!(
            config.api_key,
            SecretSource::File { ref path } if path == &PathBuf::from("/run/secrets/climacell")
        ));
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let yaml = r#"
latitude: 43.65
longitude: -79.38
target_tz: "America/Atlantis"
"#;
        let config: RelayConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(config.validate(), Err(RelayError::Config(_))));
    }

    #[test]
    fn test_out_of_range_latitude_rejected() {
        let yaml = r#"
latitude: 97.0
longitude: 0.0
"#;
        let config: RelayConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(matches!(config.validate(), Err(RelayError::Config(_))));
    }

    #[test]
    fn test_zone_accessors() {
        let yaml = r#"
latitude: 43.65
longitude: -79.38
"#;
        let config: RelayConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.source_zone().unwrap(), chrono_tz::UTC);
        assert_eq!(
            config.target_zone().unwrap(),
            chrono_tz::America::Toronto
        );
    }
}
