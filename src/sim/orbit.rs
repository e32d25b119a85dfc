//! Orbiting subjects of the primary view
//!
//! Kinematic circles around the sun at the origin. Nothing here is physical:
//! each body just sweeps its angle at a constant rate.

use std::f32::consts::TAU;

use glam::{Quat, Vec3};

use crate::error::{ConfigError, Result};
use crate::tuning::{BodyTuning, OrbitTuning};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitingBody {
    pub tuning: BodyTuning,
    /// Current orbit angle (radians, wrapped to [0, TAU))
    pub angle: f32,
    /// Current spin about the body's own Y axis
    pub spin: f32,
    pub position: Vec3,
}

impl OrbitingBody {
    fn new(tuning: BodyTuning) -> Self {
        let mut body = Self {
            tuning,
            angle: tuning.phase.rem_euclid(TAU),
            spin: 0.0,
            position: Vec3::ZERO,
        };
        body.position = body.compute_position();
        body
    }

    fn compute_position(&self) -> Vec3 {
        let flat = Vec3::new(
            self.tuning.orbit_radius * self.angle.cos(),
            0.0,
            self.tuning.orbit_radius * self.angle.sin(),
        );
        Quat::from_rotation_x(self.tuning.inclination) * flat
    }

    fn advance(&mut self, dt: f32) {
        self.angle = (self.angle + TAU / self.tuning.period * dt).rem_euclid(TAU);
        if self.tuning.spin_period > 0.0 {
            self.spin = (self.spin + TAU / self.tuning.spin_period * dt).rem_euclid(TAU);
        }
        self.position = self.compute_position();
    }
}

/// The sun's family
#[derive(Debug, Clone)]
pub struct SolarSystem {
    bodies: Vec<OrbitingBody>,
    time_scale: f32,
}

impl SolarSystem {
    pub fn new(tuning: &OrbitTuning) -> Result<Self> {
        if !(tuning.time_scale >= 0.0 && tuning.time_scale.is_finite()) {
            return Err(ConfigError::InvalidOrbit(format!(
                "time scale must be non-negative, found {}",
                tuning.time_scale
            )));
        }
        for (i, body) in tuning.bodies.iter().enumerate() {
            let valid = body.orbit_radius > 0.0
                && body.orbit_radius.is_finite()
                && body.period > 0.0
                && body.period.is_finite()
                && body.spin_period >= 0.0
                && body.size > 0.0
                && body.phase.is_finite()
                && body.inclination.is_finite();
            if !valid {
                return Err(ConfigError::InvalidOrbit(format!("body {i} has invalid parameters")));
            }
        }
        Ok(Self {
            bodies: tuning.bodies.iter().copied().map(OrbitingBody::new).collect(),
            time_scale: tuning.time_scale,
        })
    }

    pub fn update(&mut self, dt: f32) {
        let dt = dt * self.time_scale;
        if dt <= 0.0 {
            return;
        }
        for body in &mut self.bodies {
            body.advance(dt);
        }
    }

    pub fn bodies(&self) -> &[OrbitingBody] {
        &self.bodies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bodies_keep_their_radius() {
        let mut system = SolarSystem::new(&OrbitTuning::default()).unwrap();
        for _ in 0..1000 {
            system.update(1.0 / 60.0);
        }
        for body in system.bodies() {
            assert!((body.position.length() - body.tuning.orbit_radius).abs() < 1e-3);
        }
    }

    #[test]
    fn test_full_period_returns_home() {
        let tuning = OrbitTuning {
            time_scale: 1.0,
            bodies: vec![BodyTuning {
                orbit_radius: 10.0,
                period: 2.0,
                phase: 0.5,
                inclination: 0.1,
                spin_period: 0.0,
                size: 1.0,
            }],
        };
        let mut system = SolarSystem::new(&tuning).unwrap();
        let start = system.bodies()[0].position;
        for _ in 0..120 {
            system.update(1.0 / 60.0);
        }
        assert!(system.bodies()[0].position.distance(start) < 1e-2);
        assert_eq!(system.bodies()[0].spin, 0.0);
    }

    #[test]
    fn test_invalid_body_rejected() {
        let mut tuning = OrbitTuning::default();
        tuning.bodies[2].period = 0.0;
        assert!(matches!(SolarSystem::new(&tuning), Err(ConfigError::InvalidOrbit(_))));
    }
}
