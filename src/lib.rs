//! # Pattern Pilot Library
//!
//! Onboard decision core for catalog-driven micro-drones.
//!
//! The ground station picks a pattern from a pre-loaded catalog and streams
//! compact 20-byte commands; the drone turns each command plus its fused
//! sensor state into motor setpoints and reports back with 18-byte
//! telemetry packets.

pub mod config;
pub mod cycle;
pub mod error;
pub mod pattern;
pub mod protocol;
pub mod radio;
pub mod sensor;
pub mod telemetry;
