//! # Radio Protocol Module
//!
//! Wire formats shared with the ground coordinator.
//!
//! This module handles:
//! - Fixed-point quantization of positions, velocities and percentages
//! - Ground command packet parsing (20 bytes, little-endian)
//! - Shared flight types and flag bitfields

pub mod types;
pub mod quantize;
pub mod command;
