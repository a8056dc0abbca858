pub mod env;

use crate::agent::CycleTimings;
use crate::city::DEFAULT_CITY_ID;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Complete CivicOS configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CivicConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub oracle: OracleConfig,
    #[serde(default)]
    pub cycle: CycleConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

/// Decision oracle endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    #[serde(default = "default_oracle_endpoint")]
    pub endpoint: String,
    /// Unset means requests wait as long as the oracle takes
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_oracle_endpoint() -> String {
    "http://localhost:3001/api/cycle".to_string()
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: default_oracle_endpoint(),
            request_timeout_secs: None,
        }
    }
}

impl OracleConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Cycle scheduling
#[derive(Debug, Clone, Deserialize)]
pub struct CycleConfig {
    /// Delay before the first cycle once run-control is enabled
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,
    /// Holding period between completed cycles
    #[serde(default = "default_holding_delay_secs")]
    pub holding_delay_secs: u64,
    /// Enable run-control at start-up
    #[serde(default)]
    pub autostart: bool,
}

fn default_startup_delay_ms() -> u64 {
    1000
}

fn default_holding_delay_secs() -> u64 {
    30
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            startup_delay_ms: default_startup_delay_ms(),
            holding_delay_secs: default_holding_delay_secs(),
            autostart: false,
        }
    }
}

impl CycleConfig {
    pub fn timings(&self) -> CycleTimings {
        CycleTimings {
            startup_delay: Duration::from_millis(self.startup_delay_ms),
            holding_delay: Duration::from_secs(self.holding_delay_secs),
        }
    }
}

/// World model start-up
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_city")]
    pub default_city: String,
    /// Fixed RNG seed for reproducible runs
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_city() -> String {
    DEFAULT_CITY_ID.to_string()
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            default_city: default_city(),
            seed: None,
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<CivicConfig, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let config: CivicConfig = toml::from_str(&contents)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to defaults
pub fn load_or_default(path: &str) -> Result<CivicConfig, Box<dyn std::error::Error>> {
    if Path::new(path).exists() {
        load_config(path)
    } else {
        Ok(CivicConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = CivicConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.oracle.endpoint, "http://localhost:3001/api/cycle");
        assert_eq!(config.oracle.request_timeout(), None);
        assert_eq!(config.cycle.timings(), CycleTimings::default());
        assert!(!config.cycle.autostart);
        assert_eq!(config.simulation.default_city, "nyc");
        assert_eq!(config.simulation.seed, None);
    }

    #[test]
    fn test_config_deserialization() {
        let toml = r#"
            [server]
            port = 8080

            [oracle]
            endpoint = "http://oracle.internal/api/cycle"
            request_timeout_secs = 45

            [cycle]
            startup_delay_ms = 250
            holding_delay_secs = 5
            autostart = true

            [simulation]
            default_city = "veridia"
            seed = 7
        "#;

        let config: CivicConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.oracle.endpoint, "http://oracle.internal/api/cycle");
        assert_eq!(config.oracle.request_timeout(), Some(Duration::from_secs(45)));
        assert_eq!(
            config.cycle.timings(),
            CycleTimings {
                startup_delay: Duration::from_millis(250),
                holding_delay: Duration::from_secs(5),
            }
        );
        assert!(config.cycle.autostart);
        assert_eq!(config.simulation.default_city, "veridia");
        assert_eq!(config.simulation.seed, Some(7));
    }

    #[test]
    fn test_partial_config() {
        // Missing sections and fields use defaults
        let toml = r#"
            [cycle]
            holding_delay_secs = 10
        "#;

        let config: CivicConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.cycle.holding_delay_secs, 10);
        assert_eq!(config.cycle.startup_delay_ms, 1000);
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.simulation.default_city, "nyc");
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 4100").unwrap();

        let config = load_config(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 4100);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = \"not a number\"").unwrap();

        assert!(load_config(file.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let config = load_or_default(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(load_config(path.to_str().unwrap()).is_err());
    }
}
