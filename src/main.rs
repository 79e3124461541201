//! # Pattern Pilot
//!
//! Runs the onboard pattern executor against a UDP radio link.
//!
//! Ground commands arrive as 20-byte datagrams; telemetry leaves as 18-byte
//! datagrams at the configured downlink interval.

use anyhow::{Context, Result};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use pattern_pilot::config::Config;
use pattern_pilot::cycle::ControlCycle;
use pattern_pilot::pattern::catalog::Catalog;
use pattern_pilot::pattern::executor::PatternExecutor;
use pattern_pilot::radio::monitor::LinkMonitor;
use pattern_pilot::radio::{poll_datagram, RadioLink, UdpRadio, RADIO_MTU};
use pattern_pilot::sensor::{RestingSensor, SensorProvider, TraceSensor};
use pattern_pilot::telemetry::logger::{TelemetryLogger, TelemetryRecord};
use pattern_pilot::telemetry::packet::TELEMETRY_PACKET_SIZE;

/// Configuration used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Seconds between status log messages
const STATUS_INTERVAL_S: u64 = 5;

/// Main entry point for Pattern Pilot
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first argument, or `config/default.toml`)
///    - Set up logging with tracing subscriber
///    - Load the pattern catalog and arm the executor
///    - Bind the UDP radio and pick the sensor source
///
/// 2. **Main Loop** (at `control.loop_rate_hz`)
///    - Drain one pending command datagram
///    - Run the control cycle on the latest sensor state
///    - Every downlink interval, transmit and log telemetry
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error if the configuration, catalog or sensor trace cannot be
/// loaded, or the radio socket cannot be bound.
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    let _log_guard = init_logging(config.telemetry.trace_log_dir.as_deref());
    info!("Pattern Pilot v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from {}", config_path);

    let catalog = Catalog::load(&config.catalog.path)
        .with_context(|| format!("Failed to load catalog from {}", config.catalog.path.display()))?;
    if catalog.is_empty() {
        warn!("Catalog is empty; every command will be rejected");
    }

    let mut executor = PatternExecutor::new(&catalog);
    executor.init();
    let monitor = LinkMonitor::from_timeout(config.link.timeout(), config.control.loop_rate_hz);
    let mut cycle = ControlCycle::new(executor, monitor);

    let mut sensor: Box<dyn SensorProvider> = match &config.sensor.trace_path {
        Some(path) => Box::new(
            TraceSensor::load(path)
                .with_context(|| format!("Failed to load sensor trace {}", path.display()))?,
        ),
        None => {
            info!("No sensor trace configured, using resting sensor");
            Box::new(RestingSensor::new())
        }
    };

    let mut radio = UdpRadio::bind(config.radio.bind_addr, config.radio.ground_addr)
        .await
        .context("Failed to open radio link")?;

    let mut logger = if config.telemetry.enabled {
        Some(TelemetryLogger::new(
            &config.telemetry.log_dir,
            config.telemetry.max_records_per_file,
            config.telemetry.max_files_to_keep,
        )?)
    } else {
        None
    };

    let downlink_every =
        cycles_per_interval(config.telemetry.downlink_interval_ms, config.control.loop_rate_hz);
    let status_every = cycles_per_interval(STATUS_INTERVAL_S * 1000, config.control.loop_rate_hz);

    let mut control_interval = interval(config.control.period());
    control_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Starting control loop at {}Hz", config.control.loop_rate_hz);
    info!("Press Ctrl+C to exit");

    let mut rx = [0u8; RADIO_MTU];
    let mut tx = [0u8; TELEMETRY_PACKET_SIZE];

    loop {
        tokio::select! {
            _ = control_interval.tick() => {
                let received = poll_datagram(&mut radio, &mut rx);

                let state = sensor.read();
                let output = cycle.run(received.map(|len| &rx[..len]), &state);
                trace!("Setpoints: {:?}", output.setpoints);

                let cycles = cycle.cycles();
                if cycles % downlink_every == 0 {
                    match output.telemetry.serialize_into(&mut tx) {
                        Ok(len) => {
                            if let Err(e) = radio.transmit(&tx[..len]) {
                                debug!("Failed to send telemetry: {}", e);
                            }
                        }
                        Err(e) => warn!("Failed to encode telemetry: {}", e),
                    }

                    if let Some(logger) = logger.as_mut() {
                        let record = TelemetryRecord::now(cycles, output.telemetry, output.setpoints);
                        if let Err(e) = logger.log(&record) {
                            warn!("Failed to write telemetry log: {}", e);
                        }
                    }
                }

                if cycles % status_every == 0 {
                    info!(
                        "Cycle {}: mode {:?}, link {}",
                        cycles,
                        cycle.mode(),
                        if cycle.link_lost() { "lost" } else { "ok" }
                    );
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                info!("Total control cycles: {}", cycle.cycles());
                break;
            }
        }
    }

    Ok(())
}

/// Install the tracing subscriber, optionally writing to a daily rolling
/// file. The returned guard must live until shutdown.
fn init_logging(trace_log_dir: Option<&str>) -> Option<WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    match trace_log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "pattern-pilot.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

/// Number of control cycles in `interval_ms`, at least one.
fn cycles_per_interval(interval_ms: u64, loop_rate_hz: u32) -> u64 {
    (interval_ms * u64::from(loop_rate_hz) / 1000).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycles_per_interval() {
        // 100ms downlink at 500Hz
        assert_eq!(cycles_per_interval(100, 500), 50);
        assert_eq!(cycles_per_interval(STATUS_INTERVAL_S * 1000, 250), 1250);
        // Faster than the loop still sends every cycle
        assert_eq!(cycles_per_interval(1, 50), 1);
    }

    #[test]
    fn test_default_config_path() {
        assert_eq!(DEFAULT_CONFIG_PATH, "config/default.toml");
    }
}
