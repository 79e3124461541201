//! # Shared Flight Types
//!
//! Plain data shared by the command parser, pattern executor and telemetry
//! reporter: vectors, the fused sensor state and the motor setpoints handed
//! to the attitude controller.

use serde::{Deserialize, Serialize};

/// Sentinel pattern id meaning "no pattern".
pub const PATTERN_ID_NONE: u16 = 0xFFFF;

/// Sensor state flag bits (`SensorState::flags`).
pub mod sensor_flags {
    /// Position estimate is valid
    pub const POS_VALID: u32 = 1 << 0;
    /// Lighthouse positioning is tracking
    pub const LIGHTHOUSE_OK: u32 = 1 << 1;
    /// UWB positioning is tracking
    pub const UWB_OK: u32 = 1 << 2;
    /// Battery monitor reports low battery
    pub const LOW_BATTERY: u32 = 1 << 3;
    /// Drone sits on a charger
    pub const CHARGING: u32 = 1 << 4;
}

/// Ground command flag bits (`GroundCommand::flags`).
pub mod command_flags {
    /// Bypass the catalog and hover in place
    pub const EMERGENCY: u8 = 1 << 0;
    /// Style parameters changed
    pub const STYLE_UPDATE: u8 = 1 << 1;
    /// Switch pattern immediately
    pub const FORCE_PATTERN: u8 = 1 << 2;
}

/// Telemetry status flag bits (`TelemetryPacket::status_flags`).
pub mod status_flags {
    /// Altitude above 5 cm
    pub const AIRBORNE: u8 = 1 << 0;
    /// A catalog pattern is running
    pub const PATTERN_ACTIVE: u8 = 1 << 1;
    /// Critical battery, land now
    pub const EMERGENCY: u8 = 1 << 2;
    /// Battery below 15%
    pub const LOW_BATTERY: u8 = 1 << 3;
    /// Ground link timed out (set by the radio link only)
    pub const COMM_LOST: u8 = 1 << 4;
}

/// 3D vector (position, velocity, orientation).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    /// All-zero vector
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// The drone's current physical state from onboard sensor fusion.
///
/// Refreshed once per cycle by the fusion layer; the core only reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorState {
    /// Meters, in the positioning frame
    pub position: Vec3,
    /// m/s
    pub velocity: Vec3,
    /// Roll, pitch, yaw in radians
    pub orientation: Vec3,
    /// Remaining charge, 0.0-1.0
    pub battery_pct: f32,
    /// Volts
    pub battery_voltage: f32,
    /// Watts
    pub discharge_rate: f32,
    /// Confidence in position, 0.0-1.0
    pub pos_quality: f32,
    /// `sensor_flags` bitfield
    pub flags: u32,
}

impl SensorState {
    /// Checks a `sensor_flags` bit.
    #[must_use]
    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }
}

/// One cycle's output for the attitude controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MotorSetpoints {
    /// Degrees
    pub roll: f32,
    /// Degrees
    pub pitch: f32,
    /// Degrees/second
    pub yaw: f32,
    /// 0-65535 thrust units
    pub thrust: f32,
}

impl MotorSetpoints {
    /// Motors off
    pub const IDLE: MotorSetpoints = MotorSetpoints {
        roll: 0.0,
        pitch: 0.0,
        yaw: 0.0,
        thrust: 0.0,
    };
}
