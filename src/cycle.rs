//! # Control Cycle
//!
//! One tick of the onboard loop: take the packet the radio delivered (if
//! any), decide what to fly, run the executor and build the telemetry
//! report.
//!
//! ## Command policy
//!
//! | Input                              | Effect                                  |
//! |------------------------------------|-----------------------------------------|
//! | nothing yet                        | idle, pattern id 0xFFFF                  |
//! | packet that fails to parse         | dropped, previous behavior continues    |
//! | valid command                      | becomes the active command              |
//! | command failing catalog validation | emergency hover, pattern id 0xFFFF       |
//! | link timeout while executing       | emergency hover, pattern id 0xFFFF       |
//!
//! Emergency hover lasts until the next valid command.

use tracing::{debug, info, warn};

use crate::pattern::executor::PatternExecutor;
use crate::pattern::generators::emergency_hover;
use crate::protocol::command::GroundCommand;
use crate::protocol::types::{MotorSetpoints, SensorState, PATTERN_ID_NONE};
use crate::radio::monitor::LinkMonitor;
use crate::telemetry::packet::{build_flags, TelemetryPacket};

/// What the loop is currently flying.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlightMode {
    /// No valid command received since start
    Idle,
    /// Running a validated ground command
    Executing(GroundCommand),
    /// Hovering in place after a rejected command or lost link
    Fallback,
}

/// Result of one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleOutput {
    /// Setpoints for the attitude controller
    pub setpoints: MotorSetpoints,
    /// Status report for the ground station
    pub telemetry: TelemetryPacket,
}

/// Stateful wrapper tying the parser, executor, link monitor and telemetry
/// reporter together.
#[derive(Debug, Clone)]
pub struct ControlCycle<'a> {
    executor: PatternExecutor<'a>,
    monitor: LinkMonitor,
    mode: FlightMode,
    cycles: u64,
}

impl<'a> ControlCycle<'a> {
    #[must_use]
    pub fn new(executor: PatternExecutor<'a>, monitor: LinkMonitor) -> Self {
        Self {
            executor,
            monitor,
            mode: FlightMode::Idle,
            cycles: 0,
        }
    }

    /// Run one control cycle.
    ///
    /// # Arguments
    ///
    /// * `raw` - Datagram received this cycle, if any
    /// * `state` - Current sensor state
    ///
    /// # Returns
    ///
    /// * `CycleOutput` - Setpoints and the telemetry packet for this cycle
    pub fn run(&mut self, raw: Option<&[u8]>, state: &SensorState) -> CycleOutput {
        self.monitor.tick();

        if let Some(raw) = raw {
            self.accept(raw, state);
        }

        if self.monitor.is_lost() {
            if let FlightMode::Executing(command) = self.mode {
                warn!(
                    "Ground link lost after {} cycles, abandoning pattern {}",
                    self.monitor.timeout_cycles(),
                    command.pattern_id
                );
                self.mode = FlightMode::Fallback;
            }
        }

        let (setpoints, pattern_id) = match self.mode {
            FlightMode::Idle => (MotorSetpoints::IDLE, PATTERN_ID_NONE),
            FlightMode::Executing(command) => (self.executor.step(&command, state), command.pattern_id),
            FlightMode::Fallback => (emergency_hover(state), PATTERN_ID_NONE),
        };

        let flags = self.monitor.apply(build_flags(state, pattern_id));
        self.cycles += 1;

        CycleOutput {
            setpoints,
            telemetry: TelemetryPacket::pack(state, pattern_id, flags),
        }
    }

    fn accept(&mut self, raw: &[u8], state: &SensorState) {
        let command = match GroundCommand::parse(raw) {
            Ok(command) => command,
            Err(e) => {
                debug!("Dropping malformed packet: {}", e);
                return;
            }
        };
        self.monitor.record_contact();

        let catalog = self.executor.catalog();
        if let Err(e) = command.validate(catalog.len()) {
            warn!("Rejected command: {}", e);
            self.mode = FlightMode::Fallback;
            return;
        }

        let previous = match self.mode {
            FlightMode::Executing(active) => Some(active.pattern_id),
            _ => None,
        };
        if previous != Some(command.pattern_id) {
            info!("Switching to pattern {}", command.pattern_id);
            if let Some(entry) = catalog.lookup(command.pattern_id) {
                if !entry.admits(state) {
                    warn!(
                        "Pattern {} started below its floors (battery {:.2}, quality {:.2})",
                        command.pattern_id, state.battery_pct, state.pos_quality
                    );
                }
            }
        }
        self.mode = FlightMode::Executing(command);
    }

    #[must_use]
    pub fn mode(&self) -> FlightMode {
        self.mode
    }

    /// Cycles run so far
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    #[must_use]
    pub fn link_lost(&self) -> bool {
        self.monitor.is_lost()
    }
}
