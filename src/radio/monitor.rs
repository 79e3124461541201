//! # Link Monitor
//!
//! Tracks how many control cycles have passed since the ground station was
//! last heard. Owns the COMM_LOST telemetry bit.

use std::time::Duration;

use crate::protocol::types::status_flags;

/// Cycle-counting link supervisor.
#[derive(Debug, Clone)]
pub struct LinkMonitor {
    timeout_cycles: u32,
    cycles_since_contact: u32,
}

impl LinkMonitor {
    /// Creates a monitor that reports loss after `timeout_cycles` silent
    /// cycles (at least one).
    #[must_use]
    pub fn new(timeout_cycles: u32) -> Self {
        Self {
            timeout_cycles: timeout_cycles.max(1),
            cycles_since_contact: 0,
        }
    }

    /// Creates a monitor from a wall-clock timeout at the given loop rate.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use pattern_pilot::radio::monitor::LinkMonitor;
    ///
    /// // 500 ms at 500 Hz = 250 cycles
    /// let monitor = LinkMonitor::from_timeout(Duration::from_millis(500), 500);
    /// assert_eq!(monitor.timeout_cycles(), 250);
    /// ```
    #[must_use]
    pub fn from_timeout(timeout: Duration, loop_rate_hz: u32) -> Self {
        let cycles = timeout.as_millis() * u128::from(loop_rate_hz) / 1000;
        Self::new(u32::try_from(cycles).unwrap_or(u32::MAX))
    }

    #[must_use]
    pub fn timeout_cycles(&self) -> u32 {
        self.timeout_cycles
    }

    /// Advance one control cycle.
    pub fn tick(&mut self) {
        self.cycles_since_contact = self.cycles_since_contact.saturating_add(1);
    }

    /// A well-formed packet arrived this cycle.
    pub fn record_contact(&mut self) {
        self.cycles_since_contact = 0;
    }

    #[must_use]
    pub fn is_lost(&self) -> bool {
        self.cycles_since_contact >= self.timeout_cycles
    }

    /// OR COMM_LOST into `flags` when the link is down.
    #[must_use]
    pub fn apply(&self, flags: u8) -> u8 {
        if self.is_lost() {
            flags | status_flags::COMM_LOST
        } else {
            flags
        }
    }
}
