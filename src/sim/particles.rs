//! Particle layers
//!
//! Each layer owns N particles and one seeded RNG. Per frame:
//! `position += velocity * delta * REFERENCE_FPS * multiplier`, then the
//! layer's boundary policy runs. Opacity and size breathing are layer-level
//! scalars and never touch individual particles.

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::REFERENCE_FPS;
use crate::error::Result;
use crate::renderer::ParticleInstance;
use crate::tuning::LayerConfig;
use crate::{cylindrical_to_cartesian, spherical_to_cartesian};

/// Where particles are spawned
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Distribution {
    /// Spherical shell around the origin
    Shell { inner_radius: f32, outer_radius: f32 },
    /// Tube around the Z axis between `far_z` and `near_z` (far < near)
    Tube {
        inner_radius: f32,
        outer_radius: f32,
        far_z: f32,
        near_z: f32,
    },
}

/// What happens when a particle leaves the simulated volume
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Outward velocity components past `bound` are multiplied by `damping` (negative)
    ReflectDamp { bound: f32, damping: f32 },
    /// Particles passing the tube's near end respawn at its far end
    Recycle,
}

/// Speed ramp used while rushing through the transition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Acceleration {
    /// Multiplier growth per second
    pub rate: f32,
    pub max_multiplier: f32,
}

impl Acceleration {
    pub fn multiplier(&self, elapsed: f32) -> f32 {
        (1.0 + self.rate * elapsed).min(self.max_multiplier)
    }
}

/// Slow layer-wide oscillation of opacity and size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Breathing {
    /// Hz
    pub frequency: f32,
    /// 0 = steady, 1 = fades fully out at the trough
    pub amplitude: f32,
}

impl Breathing {
    /// Factor in [1 - amplitude, 1]
    pub fn factor(&self, elapsed: f32) -> f32 {
        1.0 - self.amplitude * (0.5 + 0.5 * (TAU * self.frequency * elapsed).sin())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub size: f32,
    pub color: Vec3,
}

/// A contiguous particle buffer with its own kinematics and boundary policy
#[derive(Debug, Clone)]
pub struct ParticleLayer {
    config: LayerConfig,
    particles: Vec<Particle>,
    rng: Pcg32,
    elapsed: f32,
    fade: f32,
    breathing_enabled: bool,
}

impl ParticleLayer {
    pub fn new(config: LayerConfig) -> Result<Self> {
        config.validate()?;
        let mut layer = Self {
            rng: Pcg32::seed_from_u64(config.seed),
            config,
            particles: Vec::new(),
            elapsed: 0.0,
            fade: 1.0,
            breathing_enabled: true,
        };
        layer.respawn_all();
        Ok(layer)
    }

    /// Change the particle count and re-initialize every particle
    pub fn resize(&mut self, count: usize) {
        self.config.count = count;
        self.reset();
    }

    /// Fresh particles, zero elapsed, full fade. Reseeds so every run starts identically.
    pub fn reset(&mut self) {
        self.rng = Pcg32::seed_from_u64(self.config.seed);
        self.elapsed = 0.0;
        self.fade = 1.0;
        self.respawn_all();
    }

    fn respawn_all(&mut self) {
        let config = &self.config;
        let rng = &mut self.rng;
        self.particles.clear();
        self.particles.reserve(config.count);
        self.particles.extend((0..config.count).map(|_| spawn(rng, config)));
    }

    /// Advance every particle by one frame
    pub fn step(&mut self, delta: f32) {
        if delta <= 0.0 {
            return;
        }
        self.elapsed += delta;
        let multiplier = self.multiplier();
        let factor = delta * REFERENCE_FPS * multiplier;

        match (self.config.policy, self.config.distribution) {
            (BoundaryPolicy::ReflectDamp { bound, damping }, _) => {
                for particle in &mut self.particles {
                    particle.position += particle.velocity * factor;
                    reflect_damp(particle, bound, damping);
                }
            }
            (
                BoundaryPolicy::Recycle,
                Distribution::Tube {
                    inner_radius,
                    outer_radius,
                    far_z,
                    near_z,
                },
            ) => {
                let rng = &mut self.rng;
                for particle in &mut self.particles {
                    particle.position += particle.velocity * factor;
                    if particle.position.z > near_z {
                        particle.position = respawn_on_tube(rng, inner_radius, outer_radius, far_z);
                    }
                }
            }
            // Rejected by LayerConfig::validate
            (BoundaryPolicy::Recycle, Distribution::Shell { .. }) => {}
        }
    }

    /// Current speed multiplier from the acceleration ramp
    pub fn multiplier(&self) -> f32 {
        self.config
            .acceleration
            .map_or(1.0, |ramp| ramp.multiplier(self.elapsed))
    }

    /// Layer-level visibility envelope, set by whoever owns the layer's timing
    pub fn set_fade(&mut self, fade: f32) {
        self.fade = if fade.is_finite() { fade.clamp(0.0, 1.0) } else { 0.0 };
    }

    pub fn set_breathing_enabled(&mut self, enabled: bool) {
        self.breathing_enabled = enabled;
    }

    fn breath(&self) -> f32 {
        match self.config.breathing {
            Some(breathing) if self.breathing_enabled => breathing.factor(self.elapsed),
            _ => 1.0,
        }
    }

    /// Layer opacity after fade and breathing
    pub fn opacity(&self) -> f32 {
        self.config.opacity * self.fade * self.breath()
    }

    /// Size scale from breathing (swells less than opacity)
    pub fn size_scale(&self) -> f32 {
        0.5 + 0.5 * self.breath()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Fill `out` with GPU-ready instances (cleared first)
    pub fn write_instances(&self, out: &mut Vec<ParticleInstance>) {
        let alpha = self.opacity();
        let size_scale = self.size_scale();
        out.clear();
        out.extend(
            self.particles
                .iter()
                .map(|p| ParticleInstance::new(p.position, p.size * size_scale, p.color, alpha)),
        );
    }
}

fn spawn(rng: &mut Pcg32, config: &LayerConfig) -> Particle {
    let position = match config.distribution {
        Distribution::Shell {
            inner_radius,
            outer_radius,
        } => sample_shell(rng, inner_radius, outer_radius),
        Distribution::Tube {
            inner_radius,
            outer_radius,
            far_z,
            near_z,
        } => {
            let z = rng.random_range(far_z..=near_z);
            let mut p = respawn_on_tube(rng, inner_radius, outer_radius, far_z);
            p.z = z;
            p
        }
    };

    let mut jitter = Vec3::new(
        rng.random_range(-1.0..=1.0),
        rng.random_range(-1.0..=1.0),
        rng.random_range(-1.0..=1.0),
    );
    // Tube particles run straight down the tube so the ring distribution holds
    if matches!(config.distribution, Distribution::Tube { .. }) {
        jitter.x = 0.0;
        jitter.y = 0.0;
    }
    let velocity = jitter * config.speed + config.axis_velocity * rng.random_range(0.5..=1.5);

    let [min_size, max_size] = config.size;
    let size = rng.random_range(min_size..=max_size);
    let [a, b] = config.colors;
    let color = a.lerp(b, rng.random::<f32>());

    Particle {
        position,
        velocity,
        size,
        color,
    }
}

/// Uniform direction, radius uniform in [inner, outer]
fn sample_shell(rng: &mut Pcg32, inner: f32, outer: f32) -> Vec3 {
    let theta = rng.random_range(0.0..TAU);
    let phi = (1.0 - 2.0 * rng.random::<f32>()).clamp(-1.0, 1.0).acos();
    let r = rng.random_range(inner..=outer);
    spherical_to_cartesian(r, theta, phi.clamp(0.0, PI))
}

/// Fresh angle and radius on the tube's far ring
fn respawn_on_tube(rng: &mut Pcg32, inner: f32, outer: f32, far_z: f32) -> Vec3 {
    let theta = rng.random_range(0.0..TAU);
    let r = rng.random_range(inner..=outer);
    cylindrical_to_cartesian(r, theta, far_z)
}

/// Soft bounce: outward velocity past the bound is reversed and damped
fn reflect_damp(particle: &mut Particle, bound: f32, damping: f32) {
    for axis in 0..3 {
        let p = particle.position[axis];
        let v = particle.velocity[axis];
        if p.abs() > bound && p * v > 0.0 {
            particle.velocity[axis] = v * damping;
        }
    }
}
