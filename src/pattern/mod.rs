//! # Pattern Module
//!
//! Catalog-driven behavior execution.
//!
//! This module handles:
//! - Loading and looking up catalog entries (108-byte records or TOML)
//! - Resolving bounded pattern parameters
//! - The eight motion generators and the emergency hover fallback
//! - Dispatching a ground command to its generator each cycle

pub mod catalog;
pub mod generators;
pub mod executor;
