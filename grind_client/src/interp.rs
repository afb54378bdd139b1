//! Interpolation and fixed-step timing.
//!
//! The room sends sparse updates; the client renders at its own rate. Every
//! fixed tick each entity closes a constant fraction of the gap to its last
//! known server position.

use std::time::Duration;

use grind_shared::math::Vec2;

/// Blends `current` toward `target`, closing `factor` of the gap.
pub fn blend_toward(current: Vec2, target: Vec2, factor: f32) -> Vec2 {
    current.lerp(target, factor)
}

/// Accumulator that turns variable frame deltas into whole fixed steps.
///
/// Time is kept in whole nanoseconds so that frame deltas summing to an exact
/// multiple of the step always drain that many steps.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: Duration,
    accumulated: Duration,
}

impl FixedTimestep {
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            accumulated: Duration::ZERO,
        }
    }

    /// Time carried over to the next frame.
    pub fn residual(&self) -> Duration {
        self.accumulated
    }

    /// Adds `delta_ms` and returns how many fixed steps are now due.
    pub fn advance(&mut self, delta_ms: f64) -> u32 {
        if self.step.is_zero() || !delta_ms.is_finite() || delta_ms <= 0.0 {
            return 0;
        }
        self.accumulated += Duration::from_nanos((delta_ms * 1e6).round() as u64);
        let mut steps = 0;
        while self.accumulated >= self.step {
            self.accumulated -= self.step;
            steps += 1;
        }
        steps
    }

    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
    }
}
