//! Session configuration: hold duration and tick interval.

use anyhow::bail;

use crate::hand::hold::DEFAULT_HOLD_DURATION_MS;

/// Default spacing between timer ticks.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 50;

/// Timing configuration for one hand-tracking session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Time (ms) a pose must be held before it triggers.
    pub hold_duration_ms: u64,
    /// Minimum spacing (ms) between timer ticks; closer ticks are coalesced.
    pub tick_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            hold_duration_ms: DEFAULT_HOLD_DURATION_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl SessionConfig {
    pub fn new(hold_duration_ms: u64, tick_interval_ms: u64) -> anyhow::Result<Self> {
        let config = Self {
            hold_duration_ms,
            tick_interval_ms,
        };
        config.validate()?;
        Ok(config)
    }

    /// Both values must be positive, and ticks must not be slower than the
    /// hold itself or the countdown could never be observed.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.hold_duration_ms == 0 {
            bail!("hold duration must be positive");
        }
        if self.tick_interval_ms == 0 {
            bail!("tick interval must be positive");
        }
        if self.tick_interval_ms > self.hold_duration_ms {
            bail!(
                "tick interval {}ms exceeds hold duration {}ms",
                self.tick_interval_ms,
                self.hold_duration_ms
            );
        }
        Ok(())
    }

    /// Generate s-expression for IPC config.
    pub fn config_sexp(&self) -> String {
        format!(
            "(:hold-ms {} :tick-ms {})",
            self.hold_duration_ms, self.tick_interval_ms
        )
    }
}
