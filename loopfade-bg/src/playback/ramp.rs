//! Linear opacity ramp
//!
//! The transition duration `D` is split into `N` equal steps and the ramp
//! visits `N + 1` points, both endpoints included. At each point the ratio
//! `i / N` is computed once: the hidden layer gets the ratio and the active
//! layer its complement, so the pair always sums to exactly 1.0.

use std::time::Duration;

use crate::error::{Error, Result};

/// Default transition duration
pub const DEFAULT_DURATION: Duration = Duration::from_millis(10_000);

/// Default number of ramp steps
pub const DEFAULT_STEPS: u32 = 1000;

/// Upper bound on ramp steps; a cycle's whole plan is built up front
pub const MAX_STEPS: u32 = 10_000;

/// Shortest pause between ramp points for a non-zero duration
pub const MIN_STEP_INTERVAL: Duration = Duration::from_millis(1);

/// Opacities at one ramp point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampPoint {
    /// Step index, `0..=steps`
    pub step: u32,
    /// Opacity of the incoming (hidden) layer
    pub hidden: f64,
    /// Opacity of the outgoing (active) layer
    pub active: f64,
}

impl RampPoint {
    /// Point `step` of a ramp with `steps` steps
    pub fn at(step: u32, steps: u32) -> Self {
        let ratio = step as f64 / steps as f64;
        Self {
            step,
            hidden: ratio,
            active: 1.0 - ratio,
        }
    }
}

/// Duration and resolution of a crossfade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RampSettings {
    duration: Duration,
    steps: u32,
}

impl RampSettings {
    /// `steps` must be in `1..=MAX_STEPS`, and for a non-zero `duration` the
    /// step interval `duration / steps` must be at least [`MIN_STEP_INTERVAL`]
    pub fn new(duration: Duration, steps: u32) -> Result<Self> {
        if steps == 0 {
            return Err(Error::Config("crossfade steps must be at least 1".to_string()));
        }
        if steps > MAX_STEPS {
            return Err(Error::Config(format!(
                "crossfade steps must be at most {}, got {}",
                MAX_STEPS, steps
            )));
        }
        if !duration.is_zero() && duration / steps < MIN_STEP_INTERVAL {
            return Err(Error::Config(format!(
                "crossfade of {:?} in {} steps pauses less than {:?} per step",
                duration, steps, MIN_STEP_INTERVAL
            )));
        }
        Ok(Self { duration, steps })
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Delay between consecutive points (`D / N`)
    pub fn step_interval(&self) -> Duration {
        self.duration / self.steps
    }

    /// All `N + 1` points in order
    pub fn points(&self) -> impl Iterator<Item = RampPoint> {
        let steps = self.steps;
        (0..=steps).map(move |step| RampPoint::at(step, steps))
    }
}

impl Default for RampSettings {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION,
            steps: DEFAULT_STEPS,
        }
    }
}
