//! Orrery - a solar-system scene with a cinematic hand-off into a detail view
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (clock, easing, phases, camera rig, particles, scene modes)
//! - `renderer`: Read-only snapshots handed to the rendering backend
//! - `platform`: Browser bridge for the UI collaborator
//! - `settings`: Player-facing preferences
//! - `tuning`: Data-driven motion and particle constants

pub mod error;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::ConfigError;
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

use glam::Vec3;

/// Scene configuration constants
pub mod consts {
    /// Frame rate the per-frame particle velocities are authored against
    pub const REFERENCE_FPS: f32 = 60.0;
    /// Longest frame the browser loop forwards after a tab stall
    pub const MAX_FRAME_DELTA: f32 = 0.1;
    /// Progress closer than this to 1.0 counts as complete
    pub const PROGRESS_EPSILON: f32 = 1e-6;
    /// Tolerance when checking that phase bounds meet
    pub const PHASE_BOUND_EPSILON: f32 = 1e-5;

    /// Where the primary view camera rests
    pub const PRIMARY_CAMERA_POSITION: [f32; 3] = [0.0, 30.0, 80.0];
    pub const PRIMARY_FOV: f32 = 60.0;
    /// Where the transition leaves the camera in the detail view
    pub const DETAIL_CAMERA_POSITION: [f32; 3] = [0.0, 2.0, 14.0];
    pub const DETAIL_FOV: f32 = 50.0;
    pub const BASE_EXPOSURE: f32 = 1.0;
}

/// Map a frame delta from the outside world to something safe to integrate.
///
/// NaN, infinities and negative values become 0. Valid deltas pass through
/// untouched; stall capping belongs to the frame loop that measures them.
#[inline]
pub fn sanitize_delta(delta: f32) -> f32 {
    if !delta.is_finite() || delta <= 0.0 {
        return 0.0;
    }
    delta
}

/// Convert spherical (r, theta, phi) to cartesian, phi measured from +Y
#[inline]
pub fn spherical_to_cartesian(r: f32, theta: f32, phi: f32) -> Vec3 {
    Vec3::new(
        r * phi.sin() * theta.cos(),
        r * phi.cos(),
        r * phi.sin() * theta.sin(),
    )
}

/// Convert a point on a tube around the Z axis to cartesian
#[inline]
pub fn cylindrical_to_cartesian(r: f32, theta: f32, z: f32) -> Vec3 {
    Vec3::new(r * theta.cos(), r * theta.sin(), z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_delta() {
        assert_eq!(sanitize_delta(f32::NAN), 0.0);
        assert_eq!(sanitize_delta(f32::INFINITY), 0.0);
        assert_eq!(sanitize_delta(-0.5), 0.0);
        assert_eq!(sanitize_delta(1.0 / 60.0), 1.0 / 60.0);
        assert_eq!(sanitize_delta(3.0), 3.0);
    }

    #[test]
    fn test_spherical_radius() {
        let p = spherical_to_cartesian(12.0, 1.3, 0.7);
        assert!((p.length() - 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_cylindrical_radius() {
        let p = cylindrical_to_cartesian(5.0, 2.0, -40.0);
        assert!((p.truncate().length() - 5.0).abs() < 1e-4);
        assert_eq!(p.z, -40.0);
    }
}
