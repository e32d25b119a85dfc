//! Animation clock
//!
//! Hands out the delta to apply each frame. A stopped clock hands out zero.

use serde::{Deserialize, Serialize};

use crate::sanitize_delta;

/// Monotonic elapsed-time source for one animation run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnimationClock {
    elapsed: f32,
    running: bool,
}

impl AnimationClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset elapsed time and arm the clock
    pub fn start(&mut self) {
        self.elapsed = 0.0;
        self.running = true;
    }

    /// Disarm the clock, freezing the last elapsed value
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Consume a frame delta, returning the delta to apply this frame
    pub fn tick(&mut self, frame_delta: f32) -> f32 {
        if !self.running {
            return 0.0;
        }
        let delta = sanitize_delta(frame_delta);
        self.elapsed += delta;
        delta
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stopped_clock_yields_zero() {
        let mut clock = AnimationClock::new();
        assert_eq!(clock.tick(0.016), 0.0);
        assert_eq!(clock.elapsed(), 0.0);
    }

    #[test]
    fn test_start_stop_freezes_elapsed() {
        let mut clock = AnimationClock::new();
        clock.start();
        assert_eq!(clock.tick(0.05), 0.05);
        assert_eq!(clock.tick(0.05), 0.05);
        clock.stop();
        assert_eq!(clock.tick(0.05), 0.0);
        assert!((clock.elapsed() - 0.1).abs() < 1e-6);

        clock.start();
        assert_eq!(clock.elapsed(), 0.0);
        assert!(clock.is_running());
    }

    #[test]
    fn test_long_frame_passes_through() {
        let mut clock = AnimationClock::new();
        clock.start();
        assert_eq!(clock.tick(0.25), 0.25);
        assert_eq!(clock.tick(2.0), 2.0);
        assert!((clock.elapsed() - 2.25).abs() < 1e-6);
    }

    #[test]
    fn test_bad_deltas_clamped() {
        let mut clock = AnimationClock::new();
        clock.start();
        assert_eq!(clock.tick(-1.0), 0.0);
        assert_eq!(clock.tick(f32::NAN), 0.0);
        assert_eq!(clock.elapsed(), 0.0);
    }
}
