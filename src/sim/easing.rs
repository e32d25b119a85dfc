//! Easing curves
//!
//! Pure `[0, 1] -> [0, 1]` functions with `f(0) = 0` and `f(1) = 1`.

use std::f32::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

/// Easing curve applied to phase-local time
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Easing {
    Linear,
    #[default]
    CubicInOut,
    QuadOut,
    SineInOut,
    /// Linear ramp with a decaying oscillation on top. Not monotonic; only for secondary motion.
    Wobble { cycles: f32, amplitude: f32 },
}

/// Largest wobble amplitude that keeps the curve inside [0, 1]
pub const MAX_WOBBLE_AMPLITUDE: f32 = 0.25;

impl Easing {
    /// Evaluate the curve. Input is clamped to [0, 1].
    pub fn apply(&self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match *self {
            Easing::Linear => t,
            Easing::CubicInOut => cubic_in_out(t),
            Easing::QuadOut => quad_out(t),
            Easing::SineInOut => sine_in_out(t),
            Easing::Wobble { cycles, amplitude } => wobble(t, cycles, amplitude),
        }
    }

    /// Whether the parameters keep the curve a `[0, 1] -> [0, 1]` map
    pub fn is_bounded(&self) -> bool {
        match *self {
            Easing::Wobble { cycles, amplitude } => {
                cycles.is_finite() && cycles >= 0.0 && (0.0..=MAX_WOBBLE_AMPLITUDE).contains(&amplitude)
            }
            _ => true,
        }
    }
}

pub fn cubic_in_out(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

pub fn quad_out(t: f32) -> f32 {
    1.0 - (1.0 - t) * (1.0 - t)
}

pub fn sine_in_out(t: f32) -> f32 {
    -((PI * t).cos() - 1.0) / 2.0
}

/// `t(1 - t)` envelope pins both endpoints. Stays in [0, 1] for amplitude <= 0.25.
pub fn wobble(t: f32, cycles: f32, amplitude: f32) -> f32 {
    (t + amplitude * 4.0 * t * (1.0 - t) * (TAU * cycles * t).sin()).clamp(0.0, 1.0)
}
