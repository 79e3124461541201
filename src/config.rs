//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PilotError, Result};

/// Control loop rates the attitude controller accepts, Hz
pub const ALLOWED_LOOP_RATES_HZ: [u32; 5] = [50, 100, 250, 500, 1000];

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub radio: RadioConfig,
    pub control: ControlConfig,
    pub link: LinkConfig,
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub sensor: SensorConfig,
    pub telemetry: TelemetryConfig,
}

/// Radio transport configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RadioConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    #[serde(default = "default_ground_addr")]
    pub ground_addr: SocketAddr,
}

/// Control loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControlConfig {
    #[serde(default = "default_loop_rate_hz")]
    pub loop_rate_hz: u32,
}

/// Ground link supervision
#[derive(Debug, Deserialize, Clone)]
pub struct LinkConfig {
    #[serde(default = "default_link_timeout_ms")]
    pub timeout_ms: u64,
}

/// Pattern catalog location
#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
}

/// Sensor source; a resting drone unless a trace is given
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SensorConfig {
    #[serde(default)]
    pub trace_path: Option<PathBuf>,
}

/// Telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_downlink_interval_ms")]
    pub downlink_interval_ms: u64,

    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,

    #[serde(default = "default_log_format")]
    pub format: String,

    /// Daily-rolling tracing log file; stdout only when unset
    #[serde(default)]
    pub trace_log_dir: Option<String>,
}

// Default value functions
fn default_bind_addr() -> SocketAddr { SocketAddr::from(([0, 0, 0, 0], 14550)) }
fn default_ground_addr() -> SocketAddr { SocketAddr::from(([127, 0, 0, 1], 14551)) }

fn default_loop_rate_hz() -> u32 { 500 }

fn default_link_timeout_ms() -> u64 { 500 }

fn default_catalog_path() -> PathBuf { PathBuf::from("config/catalog.toml") }

fn default_downlink_interval_ms() -> u64 { 100 }
fn default_telemetry_enabled() -> bool { true }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }
fn default_log_format() -> String { "jsonl".to_string() }

impl ControlConfig {
    /// Control period derived from the loop rate
    #[must_use]
    pub fn period(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.loop_rate_hz.max(1)))
    }
}

impl LinkConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use pattern_pilot::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if !ALLOWED_LOOP_RATES_HZ.contains(&self.control.loop_rate_hz) {
            return Err(invalid("loop_rate_hz must be one of: 50, 100, 250, 500, 1000"));
        }

        // The link must be able to miss at least one cycle
        let period_ms = 1000 / u64::from(self.control.loop_rate_hz);
        if self.link.timeout_ms <= period_ms || self.link.timeout_ms > 60000 {
            return Err(invalid(format!(
                "link timeout_ms must be between {} and 60000",
                period_ms + 1
            )));
        }

        if self.catalog.path.as_os_str().is_empty() {
            return Err(invalid("catalog path cannot be empty"));
        }

        if let Some(trace) = &self.sensor.trace_path {
            if trace.as_os_str().is_empty() {
                return Err(invalid("sensor trace_path cannot be empty when set"));
            }
        }

        if self.telemetry.downlink_interval_ms == 0 || self.telemetry.downlink_interval_ms > 60000 {
            return Err(invalid("downlink_interval_ms must be between 1 and 60000"));
        }

        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        if self.telemetry.format != "jsonl" {
            return Err(invalid("log format must be 'jsonl' (only supported format)"));
        }

        Ok(())
    }
}

fn invalid(msg: impl std::fmt::Display) -> PilotError {
    PilotError::Config(toml::de::Error::custom(msg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
        [radio]
        [control]
        [link]
        [catalog]
        [telemetry]
    "#;

    fn with_section(section: &str, body: &str) -> String {
        MINIMAL.replace(&format!("[{}]", section), &format!("[{}]\n{}", section, body))
    }

    fn expect_invalid(contents: &str, needle: &str) {
        match Config::from_toml(contents) {
            Err(PilotError::Config(e)) => {
                assert!(e.to_string().contains(needle), "unexpected message: {}", e)
            }
            other => panic!("Expected config error containing {:?}, got {:?}", needle, other),
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_toml(MINIMAL).unwrap();
        assert_eq!(config.radio.bind_addr, default_bind_addr());
        assert_eq!(config.radio.ground_addr, default_ground_addr());
        assert_eq!(config.control.loop_rate_hz, 500);
        assert_eq!(config.control.period(), Duration::from_millis(2));
        assert_eq!(config.link.timeout(), Duration::from_millis(500));
        assert_eq!(config.catalog.path, PathBuf::from("config/catalog.toml"));
        assert!(config.sensor.trace_path.is_none());
        assert!(config.telemetry.enabled);
        assert_eq!(config.telemetry.downlink_interval_ms, 100);
        assert_eq!(config.telemetry.format, "jsonl");
        assert!(config.telemetry.trace_log_dir.is_none());
    }

    #[test]
    fn test_full_config() {
        let contents = r#"
            [radio]
            bind_addr = "127.0.0.1:9000"
            ground_addr = "192.168.1.10:9001"

            [control]
            loop_rate_hz = 250

            [link]
            timeout_ms = 1000

            [catalog]
            path = "/opt/catalog.bin"

            [sensor]
            trace_path = "traces/hover.jsonl"

            [telemetry]
            downlink_interval_ms = 50
            enabled = false
            log_dir = ""
            max_records_per_file = 500
            max_files_to_keep = 3
            trace_log_dir = "/var/log/pilot"
        "#;
        let config = Config::from_toml(contents).unwrap();
        assert_eq!(config.radio.bind_addr.port(), 9000);
        assert_eq!(config.control.period(), Duration::from_millis(4));
        assert_eq!(config.catalog.path, PathBuf::from("/opt/catalog.bin"));
        assert_eq!(config.sensor.trace_path, Some(PathBuf::from("traces/hover.jsonl")));
        assert!(!config.telemetry.enabled);
        assert_eq!(config.telemetry.max_files_to_keep, 3);
        assert_eq!(config.telemetry.trace_log_dir.as_deref(), Some("/var/log/pilot"));
    }

    #[test]
    fn test_missing_section_fails() {
        let contents = MINIMAL.replace("[link]", "");
        assert!(matches!(Config::from_toml(&contents), Err(PilotError::Config(_))));
    }

    #[test]
    fn test_invalid_loop_rate() {
        expect_invalid(&with_section("control", "loop_rate_hz = 400"), "loop_rate_hz");
    }

    #[test]
    fn test_link_timeout_must_exceed_period() {
        let contents = with_section("control", "loop_rate_hz = 50")
            .replace("[link]", "[link]\ntimeout_ms = 20");
        expect_invalid(&contents, "timeout_ms");

        let contents = with_section("control", "loop_rate_hz = 50")
            .replace("[link]", "[link]\ntimeout_ms = 21");
        assert!(Config::from_toml(&contents).is_ok());
    }

    #[test]
    fn test_invalid_telemetry_values() {
        expect_invalid(&with_section("telemetry", "downlink_interval_ms = 0"), "downlink_interval_ms");
        expect_invalid(&with_section("telemetry", "log_dir = \"\""), "log_dir");
        expect_invalid(&with_section("telemetry", "max_records_per_file = 0"), "max_records_per_file");
        expect_invalid(&with_section("telemetry", "max_files_to_keep = 0"), "max_files_to_keep");
        expect_invalid(&with_section("telemetry", "format = \"csv\""), "jsonl");
    }

    #[test]
    fn test_empty_paths_rejected() {
        expect_invalid(&with_section("catalog", "path = \"\""), "catalog path");
        let contents = format!("{}\n[sensor]\ntrace_path = \"\"\n", MINIMAL);
        expect_invalid(&contents, "trace_path");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", with_section("control", "loop_rate_hz = 1000")).unwrap();
        file.flush().unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.control.loop_rate_hz, 1000);
        assert_eq!(config.control.period(), Duration::from_millis(1));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/pattern-pilot.toml");
        assert!(matches!(result, Err(PilotError::Io(_))));
    }
}
