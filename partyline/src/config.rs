//! Hardware revision configuration. The physical installations differ in
//! switch polarity, ringer wiring, and cadence timing; everything that varies
//! between them lives here so the components themselves exist exactly once.

use std::time::Duration;

use thiserror::Error;

use crate::events::Edge;

/// Which edges of the dial switches are significant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DialConfig {
    /// The dial-read transition that marks one pulse. With pull-up wiring
    /// the switch releasing reads as a rising edge.
    pub pulse_edge: Edge,
    /// The dialing-switch transition that marks the dial returning to rest.
    pub rest_edge: Edge,
}

/// Physical-to-boolean mapping for the hook switch.
///
/// The convention throughout this crate is that `true` means the handset is
/// off-hook (picked up). With pull-up wiring the hook switch closes when the
/// handset leaves the cradle, so the off-hook edge is the falling one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandsetConfig {
    pub off_hook_edge: Edge,
}

/// How the bell is excited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RingStrategy {
    /// Alternate the two ring lines in software to emulate AC excitation.
    Alternate,
    /// Hold a dedicated enable line high for the whole run; the bell circuit
    /// produces its own oscillation.
    EnableLine,
}

/// Cadence timing for one ring run.
#[derive(Clone, Debug)]
pub struct RingConfig {
    pub strategy: RingStrategy,
    /// Period of the cadence tick.
    pub tick_interval: Duration,
    /// Phase alternations per repeat.
    pub phase_budget: u32,
    /// Repeats per run.
    pub repeat_budget: u32,
    /// Minimum silence between repeats.
    pub pause: Duration,
}

/// Everything that differs between hardware revisions.
#[derive(Clone, Debug)]
pub struct PhoneConfig {
    pub dial: DialConfig,
    pub handset: HandsetConfig,
    pub ring: RingConfig,
}

impl PhoneConfig {
    /// Revision A: pull-up switches, two bare ring lines, 40ms tick,
    /// 30 phases x 3 repeats with a 500ms pause.
    pub fn rev_a() -> Self {
        Self {
            dial: DialConfig {
                pulse_edge: Edge::Rise,
                rest_edge: Edge::Rise,
            },
            handset: HandsetConfig {
                off_hook_edge: Edge::Fall,
            },
            ring: RingConfig {
                strategy: RingStrategy::Alternate,
                tick_interval: Duration::from_millis(40),
                phase_budget: 30,
                repeat_budget: 3,
                pause: Duration::from_millis(500),
            },
        }
    }

    /// Revision B: same switch wiring, but the bell sits behind its own
    /// driver circuit with an enable line, and rings a single short burst.
    pub fn rev_b() -> Self {
        Self {
            ring: RingConfig {
                strategy: RingStrategy::EnableLine,
                tick_interval: Duration::from_millis(20),
                phase_budget: 20,
                repeat_budget: 1,
                pause: Duration::from_millis(500),
            },
            ..Self::rev_a()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ring.tick_interval.is_zero() {
            return Err(ConfigError::ZeroTickInterval);
        }
        if self.ring.phase_budget == 0 {
            return Err(ConfigError::ZeroPhaseBudget);
        }
        if self.ring.repeat_budget == 0 {
            return Err(ConfigError::ZeroRepeatBudget);
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ring tick interval must be non-zero")]
    ZeroTickInterval,
    #[error("ring phase budget must be non-zero")]
    ZeroPhaseBudget,
    #[error("ring repeat budget must be non-zero")]
    ZeroRepeatBudget,
}
