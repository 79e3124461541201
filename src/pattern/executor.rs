//! # Pattern Executor
//!
//! Turns a ground command and the current sensor state into motor setpoints.
//!
//! The executor never invents behavior: it looks the commanded pattern up in
//! the catalog, dispatches on its generator type and clamps the result.
//! Every error path ends in [`emergency_hover`].
//!
//! ## Usage
//!
//! ```
//! use pattern_pilot::pattern::catalog::{Catalog, PatternEntry};
//! use pattern_pilot::pattern::executor::PatternExecutor;
//! use pattern_pilot::protocol::command::GroundCommand;
//! use pattern_pilot::protocol::types::SensorState;
//!
//! let catalog = Catalog::new(vec![PatternEntry::default()]);
//! let mut executor = PatternExecutor::new(&catalog);
//! executor.init();
//!
//! let setpoints = executor.step(&GroundCommand::default(), &SensorState::default());
//! assert_eq!(setpoints.thrust, 41500.0);
//! ```

use tracing::trace;

use super::catalog::{Catalog, GeneratorType, PatternEntry};
use super::generators::{self, clamp_setpoints, emergency_hover};
use crate::protocol::command::GroundCommand;
use crate::protocol::types::{MotorSetpoints, SensorState};

/// Catalog-driven control-law dispatcher.
///
/// Holds no per-cycle memory: apart from the `initialized` flag, each
/// [`PatternExecutor::step`] is a pure function of its inputs and the catalog.
#[derive(Debug, Clone)]
pub struct PatternExecutor<'a> {
    catalog: &'a Catalog,
    initialized: bool,
}

impl<'a> PatternExecutor<'a> {
    /// Creates an executor over `catalog`. It refuses to act until
    /// [`PatternExecutor::init`] is called.
    #[must_use]
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            initialized: false,
        }
    }

    /// Arms the executor.
    pub fn init(&mut self) {
        self.initialized = true;
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[must_use]
    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Execute one control cycle.
    ///
    /// # Arguments
    ///
    /// * `command` - Parsed ground command
    /// * `state` - Current sensor state
    ///
    /// # Returns
    ///
    /// * `MotorSetpoints` - idle before `init`, emergency hover for an
    ///   emergency flag, missing pattern or unknown generator, otherwise the
    ///   generator's output clamped to the safe envelope
    #[must_use]
    pub fn step(&self, command: &GroundCommand, state: &SensorState) -> MotorSetpoints {
        if !self.initialized {
            return MotorSetpoints::IDLE;
        }
        if command.is_emergency() {
            return emergency_hover(state);
        }

        let Some(entry) = self.catalog.lookup(command.pattern_id) else {
            trace!("Pattern {} not in catalog, hovering", command.pattern_id);
            return emergency_hover(state);
        };

        clamp_setpoints(Self::dispatch(command, state, entry))
    }

    fn dispatch(command: &GroundCommand, state: &SensorState, entry: &PatternEntry) -> MotorSetpoints {
        let (target, velocity) = command.decode_positions();

        match entry.generator() {
            Ok(GeneratorType::PositionHold) => generators::position_hold(state, target, entry),
            Ok(GeneratorType::VelocityTrack) => {
                generators::velocity_track(state, velocity.x, velocity.y, target.z, entry)
            }
            Ok(GeneratorType::WaypointSequence) => generators::waypoint_sequence(state, target, entry),
            Ok(GeneratorType::RelativeOffset) => generators::relative_offset(state, target, entry),
            Ok(GeneratorType::OrbitCenter) => generators::orbit_center(state, target, entry),
            Ok(GeneratorType::TrajectorySpline) => generators::trajectory_spline(state, target, entry),
            Ok(GeneratorType::EmergencyStop) => emergency_hover(state),
            Ok(GeneratorType::Idle) => MotorSetpoints::IDLE,
            Err(raw) => {
                trace!("Pattern {} has unknown generator type {}", entry.id, raw);
                emergency_hover(state)
            }
        }
    }
}
