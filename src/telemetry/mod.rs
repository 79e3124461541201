//! # Telemetry Module
//!
//! Builds the outbound status report and logs it.
//!
//! This module handles:
//! - Deriving status flags from sensor state
//! - Packing sensor state into the 18-byte telemetry packet
//! - Serializing packets for the radio link
//! - Logging telemetry records to rotating JSONL files

pub mod packet;
pub mod logger;
