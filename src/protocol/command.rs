//! # Ground Command Parser
//!
//! Deserializes the 20-byte ground station → drone command packet.
//!
//! ```text
//! Offset  Size  Field
//! 0       2     pattern_id      (u16, 0xFFFF = none)
//! 2       6     target_pos x/y/z (i16 mm)
//! 8       6     target_vel x/y/z (i16 mm/s)
//! 14      1     flags           (command_flags bitfield)
//! 15      5     reserved        (carried through untouched)
//! ```
//!
//! All multi-byte fields are little-endian and read explicitly, so parsing
//! does not depend on the host byte order.

use bytes::{Buf, BufMut};

use super::quantize::decode_distance;
use super::types::{command_flags, Vec3};
use crate::error::{PilotError, Result};

/// Ground command packet size in bytes
pub const COMMAND_PACKET_SIZE: usize = 20;

/// Trailing reserved bytes after the flags byte
pub const COMMAND_RESERVED_SIZE: usize = 5;

/// Parsed ground station command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroundCommand {
    /// Pattern identifier in the onboard catalog
    pub pattern_id: u16,
    /// Target position, millimeters
    pub target_pos: [i16; 3],
    /// Target velocity, mm/s
    pub target_vel: [i16; 3],
    /// `command_flags` bitfield
    pub flags: u8,
    /// Reserved bytes 15..20, carried through untouched
    pub reserved: [u8; COMMAND_RESERVED_SIZE],
}

impl GroundCommand {
    /// Parse a raw radio packet.
    ///
    /// # Arguments
    ///
    /// * `raw` - Packet bytes as delivered by the radio driver
    ///
    /// # Errors
    ///
    /// Returns `PilotError::CommandLength` unless `raw` is exactly
    /// [`COMMAND_PACKET_SIZE`] bytes. There are no partial parses.
    ///
    /// # Examples
    ///
    /// ```
    /// use pattern_pilot::protocol::command::GroundCommand;
    ///
    /// let mut raw = [0u8; 20];
    /// raw[0] = 0x02; // pattern 2
    /// let cmd = GroundCommand::parse(&raw).unwrap();
    /// assert_eq!(cmd.pattern_id, 2);
    ///
    /// assert!(GroundCommand::parse(&raw[..19]).is_err());
    /// ```
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.len() != COMMAND_PACKET_SIZE {
            return Err(PilotError::CommandLength {
                expected: COMMAND_PACKET_SIZE,
                actual: raw.len(),
            });
        }

        let mut buf = raw;
        let pattern_id = buf.get_u16_le();
        let target_pos = [buf.get_i16_le(), buf.get_i16_le(), buf.get_i16_le()];
        let target_vel = [buf.get_i16_le(), buf.get_i16_le(), buf.get_i16_le()];
        let flags = buf.get_u8();
        let mut reserved = [0u8; COMMAND_RESERVED_SIZE];
        buf.copy_to_slice(&mut reserved);

        Ok(Self {
            pattern_id,
            target_pos,
            target_vel,
            flags,
            reserved,
        })
    }

    /// Serialize back into the 20-byte wire layout.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; COMMAND_PACKET_SIZE] {
        let mut out = [0u8; COMMAND_PACKET_SIZE];
        let mut buf = &mut out[..];
        buf.put_u16_le(self.pattern_id);
        for &v in self.target_pos.iter().chain(self.target_vel.iter()) {
            buf.put_i16_le(v);
        }
        buf.put_u8(self.flags);
        buf.put_slice(&self.reserved);
        out
    }

    /// Check that the command references a pattern inside the catalog.
    ///
    /// A command that fails here must not be executed; the caller routes it
    /// to emergency hover instead.
    ///
    /// # Errors
    ///
    /// Returns `PilotError::PatternOutOfRange` if the catalog is empty or
    /// `pattern_id >= catalog_size`.
    pub fn validate(&self, catalog_size: usize) -> Result<()> {
        if catalog_size == 0 || usize::from(self.pattern_id) >= catalog_size {
            return Err(PilotError::PatternOutOfRange {
                pattern_id: self.pattern_id,
                catalog_size,
            });
        }
        Ok(())
    }

    /// Boolean form of [`GroundCommand::validate`].
    #[must_use]
    pub fn is_valid_for(&self, catalog_size: usize) -> bool {
        self.validate(catalog_size).is_ok()
    }

    /// Decode target position (m) and velocity (m/s) into SI units.
    #[must_use]
    pub fn decode_positions(&self) -> (Vec3, Vec3) {
        let [px, py, pz] = self.target_pos;
        let [vx, vy, vz] = self.target_vel;
        (
            Vec3::new(decode_distance(px), decode_distance(py), decode_distance(pz)),
            Vec3::new(decode_distance(vx), decode_distance(vy), decode_distance(vz)),
        )
    }

    /// Whether the emergency bit is set
    #[must_use]
    pub fn is_emergency(&self) -> bool {
        self.flags & command_flags::EMERGENCY != 0
    }
}
