//! Simulation clock.
//!
//! The tick counter is the single source of truth; the game day is derived
//! as `tick / ticks_per_day` and never stored. All arithmetic is checked.

use crate::config::TimeConfig;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Invalid time configuration (e.g. zero ticks per day).
    #[error("invalid time configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Result of advancing the clock by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    /// The new tick number.
    pub tick: u64,
    /// The game day at the new tick.
    pub day: u64,
    /// Whether this tick crossed a day boundary.
    pub day_changed: bool,
}

/// Tick counter with derived game day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimClock {
    tick: u64,
    ticks_per_day: u64,
    ticks_per_second: u64,
}

impl SimClock {
    /// Create a clock at tick 0.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if either rate is zero.
    pub fn new(config: &TimeConfig) -> Result<Self, ClockError> {
        Self::from_parts(0, config)
    }

    /// Create a clock at an arbitrary tick (state restoration, tests).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if either rate is zero.
    pub fn from_parts(tick: u64, config: &TimeConfig) -> Result<Self, ClockError> {
        if config.ticks_per_day == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "ticks_per_day must be at least 1".to_owned(),
            });
        }
        if config.ticks_per_second == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "ticks_per_second must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            tick,
            ticks_per_day: config.ticks_per_day,
            ticks_per_second: config.ticks_per_second,
        })
    }

    /// Advance the clock by one tick.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<Advance, ClockError> {
        let before = self.day();
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        let day = self.day();
        Ok(Advance {
            tick: self.tick,
            day,
            day_changed: day != before,
        })
    }

    /// Current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Current game day.
    pub fn day(&self) -> u64 {
        self.tick.checked_div(self.ticks_per_day).unwrap_or(0)
    }

    /// Convert whole seconds of game time into ticks, saturating.
    pub const fn seconds_to_ticks(&self, seconds: u64) -> u64 {
        seconds.saturating_mul(self.ticks_per_second)
    }
}
