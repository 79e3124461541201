//! # Sensor Module
//!
//! Sources of [`SensorState`] for the control loop.
//!
//! On the vehicle the fusion layer fills the state; off the vehicle the
//! binary uses either a drone resting on the pad or a recorded JSONL trace.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use tracing::info;

use crate::error::{PilotError, Result};
use crate::protocol::types::{sensor_flags, SensorState};

/// Provides one sensor snapshot per control cycle.
#[cfg_attr(test, mockall::automock)]
pub trait SensorProvider {
    /// Current fused state
    fn read(&mut self) -> SensorState;
}

/// A drone sitting on the pad with a full battery and a valid fix.
#[derive(Debug, Clone)]
pub struct RestingSensor {
    state: SensorState,
}

impl RestingSensor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: SensorState {
                battery_pct: 1.0,
                battery_voltage: 4.2,
                pos_quality: 1.0,
                flags: sensor_flags::POS_VALID,
                ..SensorState::default()
            },
        }
    }
}

impl Default for RestingSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorProvider for RestingSensor {
    fn read(&mut self) -> SensorState {
        self.state
    }
}

/// Replays recorded sensor states, one per cycle, looping at the end.
///
/// The trace is JSON Lines; each line is a (possibly partial) `SensorState`,
/// missing fields default to zero. Blank lines are skipped.
#[derive(Debug, Clone)]
pub struct TraceSensor {
    states: Vec<SensorState>,
    next: usize,
}

impl TraceSensor {
    /// Load a trace file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, a line is not valid JSON,
    /// or the trace holds no states.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let trace = Self::from_reader(BufReader::new(File::open(path)?))?;
        info!("Loaded sensor trace {} ({} states)", path.display(), trace.len());
        Ok(trace)
    }

    /// Parse a trace from any buffered reader.
    ///
    /// # Errors
    ///
    /// Same as [`TraceSensor::load`].
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut states = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            states.push(serde_json::from_str(&line)?);
        }

        if states.is_empty() {
            return Err(PilotError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                "sensor trace is empty",
            )));
        }
        Ok(Self { states, next: 0 })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl SensorProvider for TraceSensor {
    fn read(&mut self) -> SensorState {
        let state = self.states[self.next];
        self.next = (self.next + 1) % self.states.len();
        state
    }
}
