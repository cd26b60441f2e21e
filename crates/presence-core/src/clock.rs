//! Session clock.
//!
//! Evolution is driven by a simulated time delta, never by wall-clock
//! waiting. The clock counts ticks and accumulates simulated time; the tick
//! number is the source of truth for how many steps have run.

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Invalid time configuration (e.g. negative time delta).
    #[error("invalid time configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Tick counter plus accumulated simulated time.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionClock {
    /// Ticks completed so far (0 before the first tick).
    tick: u64,

    /// Simulated time added per tick.
    dt: f64,

    /// Simulated time elapsed so far.
    elapsed: f64,
}

impl SessionClock {
    /// Create a clock at tick 0 with the given per-tick delta.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `dt` is negative or not
    /// finite.
    pub fn new(dt: f64) -> Result<Self, ClockError> {
        Self::from_parts(0, dt, 0.0)
    }

    /// Create a clock from explicit parameters (useful for testing and
    /// state restoration).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `dt` or `elapsed` is
    /// negative or not finite.
    pub fn from_parts(tick: u64, dt: f64, elapsed: f64) -> Result<Self, ClockError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(ClockError::InvalidConfig {
                reason: format!("dt must be finite and non-negative, got {dt}"),
            });
        }
        if !elapsed.is_finite() || elapsed < 0.0 {
            return Err(ClockError::InvalidConfig {
                reason: format!("elapsed must be finite and non-negative, got {elapsed}"),
            });
        }
        Ok(Self { tick, dt, elapsed })
    }

    /// Advance the clock by one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        self.elapsed += self.dt;
        Ok(self.tick)
    }

    /// Return the current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Return the per-tick time delta.
    pub const fn dt(&self) -> f64 {
        self.dt
    }

    /// Return the simulated time elapsed so far.
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }
}
