//! # Telemetry Packet
//!
//! Drone → ground station status report, 18 bytes little-endian:
//!
//! ```text
//! Offset  Size  Field
//! 0       6     pos x/y/z      (i16 mm)
//! 6       6     vel x/y/z      (i16 mm/s)
//! 12      1     battery        (u8, ×200)
//! 13      2     pattern_id     (u16)
//! 15      1     status_flags   (status_flags bitfield)
//! 16      1     pos_quality    (u8, ×255)
//! 17      1     reserved       (always 0)
//! ```

use bytes::{Buf, BufMut};
use serde::Serialize;

use crate::error::{PilotError, Result};
use crate::protocol::quantize::{encode_battery, encode_distance, encode_quality};
use crate::protocol::types::{sensor_flags, status_flags, SensorState, PATTERN_ID_NONE};

/// Telemetry packet size in bytes
pub const TELEMETRY_PACKET_SIZE: usize = 18;

/// Altitude above which the drone counts as airborne, meters
pub const AIRBORNE_ALTITUDE: f32 = 0.05;

/// Battery fraction that, with the sensor's low-battery flag, means "land now"
pub const CRITICAL_BATTERY: f32 = 0.10;

/// Battery fraction for the early low-battery warning
pub const LOW_BATTERY: f32 = 0.15;

/// Quantized telemetry report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TelemetryPacket {
    /// Position, millimeters
    pub pos: [i16; 3],
    /// Velocity, mm/s
    pub vel: [i16; 3],
    /// Battery on the ×200 scale
    pub battery: u8,
    /// Active pattern, or `PATTERN_ID_NONE`
    pub pattern_id: u16,
    /// `status_flags` bitfield
    pub status_flags: u8,
    /// Position quality on the ×255 scale
    pub pos_quality: u8,
    /// Always 0 when packed locally
    pub reserved: u8,
}

impl TelemetryPacket {
    /// Pack sensor state and pattern info into a packet.
    ///
    /// `status_flags` is copied as-is; see [`build_flags`].
    #[must_use]
    pub fn pack(state: &SensorState, pattern_id: u16, status_flags: u8) -> Self {
        Self {
            pos: [
                encode_distance(state.position.x),
                encode_distance(state.position.y),
                encode_distance(state.position.z),
            ],
            vel: [
                encode_distance(state.velocity.x),
                encode_distance(state.velocity.y),
                encode_distance(state.velocity.z),
            ],
            battery: encode_battery(state.battery_pct),
            pattern_id,
            status_flags,
            pos_quality: encode_quality(state.pos_quality),
            reserved: 0,
        }
    }

    /// Encode into the 18-byte wire layout.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; TELEMETRY_PACKET_SIZE] {
        let mut out = [0u8; TELEMETRY_PACKET_SIZE];
        let mut buf = &mut out[..];
        for &v in self.pos.iter().chain(&self.vel) {
            buf.put_i16_le(v);
        }
        buf.put_u8(self.battery);
        buf.put_u16_le(self.pattern_id);
        buf.put_u8(self.status_flags);
        buf.put_u8(self.pos_quality);
        buf.put_u8(self.reserved);
        out
    }

    /// Write the packet into `buf` for radio transmission.
    ///
    /// # Returns
    ///
    /// * `Result<usize>` - Bytes written (always 18)
    ///
    /// # Errors
    ///
    /// Returns `PilotError::BufferTooSmall` if `buf` is shorter than
    /// [`TELEMETRY_PACKET_SIZE`]; nothing is written in that case.
    pub fn serialize_into(&self, buf: &mut [u8]) -> Result<usize> {
        if buf.len() < TELEMETRY_PACKET_SIZE {
            return Err(PilotError::BufferTooSmall {
                needed: TELEMETRY_PACKET_SIZE,
                available: buf.len(),
            });
        }
        buf[..TELEMETRY_PACKET_SIZE].copy_from_slice(&self.to_bytes());
        Ok(TELEMETRY_PACKET_SIZE)
    }

    /// Decode a received packet (ground side, log replay).
    ///
    /// # Errors
    ///
    /// Returns `PilotError::TelemetryLength` unless `raw` is exactly 18 bytes.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.len() != TELEMETRY_PACKET_SIZE {
            return Err(PilotError::TelemetryLength {
                expected: TELEMETRY_PACKET_SIZE,
                actual: raw.len(),
            });
        }
        let mut buf = raw;
        Ok(Self {
            pos: [buf.get_i16_le(), buf.get_i16_le(), buf.get_i16_le()],
            vel: [buf.get_i16_le(), buf.get_i16_le(), buf.get_i16_le()],
            battery: buf.get_u8(),
            pattern_id: buf.get_u16_le(),
            status_flags: buf.get_u8(),
            pos_quality: buf.get_u8(),
            reserved: buf.get_u8(),
        })
    }

    /// Checks a `status_flags` bit.
    #[must_use]
    pub fn has_status(&self, flag: u8) -> bool {
        self.status_flags & flag != 0
    }
}

/// Derive status flags from sensor state and the active pattern.
///
/// COMM_LOST is never set here; the radio link ORs it in before transmission.
/// The EMERGENCY and LOW_BATTERY checks are independent: the first needs the
/// sensor's own low-battery flag, the second is a stricter software check.
#[must_use]
pub fn build_flags(state: &SensorState, pattern_id: u16) -> u8 {
    let mut flags = 0;

    if state.position.z > AIRBORNE_ALTITUDE {
        flags |= status_flags::AIRBORNE;
    }
    if pattern_id != PATTERN_ID_NONE {
        flags |= status_flags::PATTERN_ACTIVE;
    }
    if state.has_flag(sensor_flags::LOW_BATTERY) && state.battery_pct < CRITICAL_BATTERY {
        flags |= status_flags::EMERGENCY;
    }
    if state.battery_pct < LOW_BATTERY {
        flags |= status_flags::LOW_BATTERY;
    }

    flags
}
