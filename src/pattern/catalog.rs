//! # Pattern Catalog
//!
//! The onboard catalog of pre-verified behaviors. Each [`PatternEntry`]
//! names a generator type and its bounded default parameters.
//!
//! Catalog entries have a fixed 108-byte little-endian wire layout:
//!
//! ```text
//! Offset  Size  Field
//! 0       2     id                 (u16)
//! 2       1     generator_type     (u8)
//! 3       1     pad                (written as 0, ignored on read)
//! 4       32    defaults           (f32[8])
//! 36      32    bounds_min         (f32[8])
//! 68      32    bounds_max         (f32[8])
//! 100     4     battery_floor      (f32)
//! 104     4     pos_quality_floor  (f32)
//! ```
//!
//! A catalog file is either a blob of concatenated entries (`.bin`) or a TOML
//! document with one `[[patterns]]` table per entry.

use std::fs;
use std::path::Path;

use bytes::{Buf, BufMut};
use serde::{Deserialize, Deserializer};
use tracing::{debug, info};

use crate::error::{PilotError, Result};
use crate::protocol::types::SensorState;

/// Parameter slots per pattern
pub const PATTERN_MAX_PARAMS: usize = 8;

/// Catalog entry size in bytes
pub const PATTERN_ENTRY_SIZE: usize = 108;

/// How a pattern maps sensor state to motor commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GeneratorType {
    PositionHold = 0,
    VelocityTrack = 1,
    WaypointSequence = 2,
    RelativeOffset = 3,
    OrbitCenter = 4,
    TrajectorySpline = 5,
    EmergencyStop = 6,
    Idle = 7,
}

impl TryFrom<u8> for GeneratorType {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::PositionHold,
            1 => Self::VelocityTrack,
            2 => Self::WaypointSequence,
            3 => Self::RelativeOffset,
            4 => Self::OrbitCenter,
            5 => Self::TrajectorySpline,
            6 => Self::EmergencyStop,
            7 => Self::Idle,
            other => return Err(other),
        })
    }
}

/// A single catalog-defined behavior.
///
/// `generator_type` is kept raw so that entries with an unknown generator
/// survive loading; the executor falls back to emergency hover for them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct PatternEntry {
    pub id: u16,
    pub generator_type: u8,
    #[serde(default, deserialize_with = "param_slots")]
    pub defaults: [f32; PATTERN_MAX_PARAMS],
    #[serde(default, deserialize_with = "param_slots")]
    pub bounds_min: [f32; PATTERN_MAX_PARAMS],
    #[serde(default, deserialize_with = "param_slots")]
    pub bounds_max: [f32; PATTERN_MAX_PARAMS],
    /// Minimum battery fraction to enter
    #[serde(default)]
    pub battery_floor: f32,
    /// Minimum positioning quality to enter
    #[serde(default)]
    pub pos_quality_floor: f32,
}

/// Accept up to eight values and zero-fill the rest.
fn param_slots<'de, D>(deserializer: D) -> std::result::Result<[f32; PATTERN_MAX_PARAMS], D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<f32>::deserialize(deserializer)?;
    if values.len() > PATTERN_MAX_PARAMS {
        return Err(serde::de::Error::custom(format!(
            "at most {} parameter slots allowed, got {}",
            PATTERN_MAX_PARAMS,
            values.len()
        )));
    }
    let mut slots = [0.0; PATTERN_MAX_PARAMS];
    slots[..values.len()].copy_from_slice(&values);
    Ok(slots)
}

impl PatternEntry {
    /// Resolve a parameter slot.
    ///
    /// Uses the entry's default unless it is exactly `0.0` and `fallback` is
    /// non-zero. The result is clamped to the slot's bounds only when
    /// `bounds_max > bounds_min`; an empty or inverted range means unbounded.
    /// Out-of-range slots return `fallback`.
    ///
    /// A deliberately configured `0.0` is indistinguishable from "unset".
    #[must_use]
    pub fn param(&self, slot: usize, fallback: f32) -> f32 {
        if slot >= PATTERN_MAX_PARAMS {
            return fallback;
        }
        let mut value = self.defaults[slot];
        if value == 0.0 && fallback != 0.0 {
            value = fallback;
        }
        let (lo, hi) = (self.bounds_min[slot], self.bounds_max[slot]);
        if hi > lo {
            value = value.clamp(lo, hi);
        }
        value
    }

    /// Decoded generator type, or the raw byte if unknown.
    pub fn generator(&self) -> std::result::Result<GeneratorType, u8> {
        GeneratorType::try_from(self.generator_type)
    }

    /// Whether battery and positioning quality are at or above this
    /// entry's floors.
    #[must_use]
    pub fn admits(&self, state: &SensorState) -> bool {
        state.battery_pct >= self.battery_floor && state.pos_quality >= self.pos_quality_floor
    }

    /// Parse one 108-byte catalog record.
    ///
    /// # Errors
    ///
    /// Returns `PilotError::Catalog` if `raw` is not exactly
    /// [`PATTERN_ENTRY_SIZE`] bytes.
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() != PATTERN_ENTRY_SIZE {
            return Err(PilotError::Catalog(format!(
                "entry must be {} bytes, got {}",
                PATTERN_ENTRY_SIZE,
                raw.len()
            )));
        }

        let mut buf = raw;
        let id = buf.get_u16_le();
        let generator_type = buf.get_u8();
        buf.advance(1); // pad

        let defaults = read_slots(&mut buf);
        let bounds_min = read_slots(&mut buf);
        let bounds_max = read_slots(&mut buf);

        Ok(Self {
            id,
            generator_type,
            defaults,
            bounds_min,
            bounds_max,
            battery_floor: buf.get_f32_le(),
            pos_quality_floor: buf.get_f32_le(),
        })
    }

    /// Serialize into the 108-byte catalog layout (pad byte zero).
    #[must_use]
    pub fn to_bytes(&self) -> [u8; PATTERN_ENTRY_SIZE] {
        let mut out = [0u8; PATTERN_ENTRY_SIZE];
        let mut buf = &mut out[..];
        buf.put_u16_le(self.id);
        buf.put_u8(self.generator_type);
        buf.put_u8(0);
        for &v in self.defaults.iter().chain(&self.bounds_min).chain(&self.bounds_max) {
            buf.put_f32_le(v);
        }
        buf.put_f32_le(self.battery_floor);
        buf.put_f32_le(self.pos_quality_floor);
        out
    }
}

fn read_slots(buf: &mut &[u8]) -> [f32; PATTERN_MAX_PARAMS] {
    let mut slots = [0.0f32; PATTERN_MAX_PARAMS];
    for slot in slots.iter_mut() {
        *slot = buf.get_f32_le();
    }
    slots
}

#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    patterns: Vec<PatternEntry>,
}

/// Immutable, ordered set of pattern entries.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<PatternEntry>,
}

impl Catalog {
    #[must_use]
    pub fn new(entries: Vec<PatternEntry>) -> Self {
        Self { entries }
    }

    /// Parse a blob of concatenated 108-byte entries.
    ///
    /// # Errors
    ///
    /// Returns `PilotError::Catalog` if the blob length is not a multiple of
    /// [`PATTERN_ENTRY_SIZE`].
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() % PATTERN_ENTRY_SIZE != 0 {
            return Err(PilotError::Catalog(format!(
                "blob length {} is not a multiple of {}",
                raw.len(),
                PATTERN_ENTRY_SIZE
            )));
        }
        let entries = raw
            .chunks_exact(PATTERN_ENTRY_SIZE)
            .map(PatternEntry::from_bytes)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// Parse a TOML document of `[[patterns]]` tables.
    ///
    /// # Errors
    ///
    /// Returns `PilotError::Config` if the document is malformed.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let doc: CatalogDocument = toml::from_str(contents)?;
        Ok(Self::new(doc.patterns))
    }

    /// Load a catalog file.
    ///
    /// Files ending in `.toml` are read as TOML; anything else is treated as
    /// a binary blob.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let catalog = if path.extension().is_some_and(|ext| ext == "toml") {
            Self::from_toml(&fs::read_to_string(path)?)?
        } else {
            Self::from_bytes(&fs::read(path)?)?
        };

        for entry in catalog.iter() {
            if entry.generator().is_err() {
                debug!("Pattern {} has unknown generator type {}", entry.id, entry.generator_type);
            }
        }
        info!("Loaded {} patterns from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Find an entry by identifier (linear scan).
    #[must_use]
    pub fn lookup(&self, pattern_id: u16) -> Option<&PatternEntry> {
        self.entries.iter().find(|entry| entry.id == pattern_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PatternEntry> {
        self.entries.iter()
    }
}
