//! Data-driven motion and particle constants
//!
//! Every empirically tuned number lives here as a default, so a scene can be
//! re-tuned from JSON without touching simulation code. `validate` is the
//! single gate: a bad value fails here instead of being clamped later.

use std::f32::consts::FRAC_PI_2;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{ConfigError, Result};
use crate::sim::easing::Easing;
use crate::sim::orbit::SolarSystem;
use crate::sim::particles::{Acceleration, BoundaryPolicy, Breathing, Distribution};
use crate::sim::phase::{Phase, PhaseSchedule};
use crate::sim::rig::{CameraTransform, MotionRecipe, OrientationRecipe};

/// All tuning for one scene
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub transition: TransitionTuning,
    pub rig: RigTuning,
    pub layers: LayerTunings,
    pub orbits: OrbitTuning,
}

impl Tuning {
    /// Parse and validate
    pub fn from_json(json: &str) -> Result<Self> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.transition.validate()?;
        self.rig.validate()?;
        for layer in self.layers.iter() {
            layer.validate()?;
        }
        SolarSystem::new(&self.orbits)?;
        Ok(())
    }
}

/// Transition timing and the phase list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionTuning {
    /// Progress per second
    pub rate: f32,
    /// Progress span over which transition layers fade in
    pub fade_in: f32,
    /// Progress span before completion over which they fade out
    pub fade_out: f32,
    pub phases: Vec<Phase>,
}

impl Default for TransitionTuning {
    fn default() -> Self {
        Self {
            rate: 0.25,
            fade_in: 0.15,
            fade_out: 0.2,
            phases: vec![
                Phase::new(
                    "depart",
                    0.0,
                    0.3,
                    Easing::CubicInOut,
                    MotionRecipe {
                        position: Vec3::new(0.0, 18.0, 45.0),
                        fov: 65.0,
                        exposure: 1.15,
                        orientation: OrientationRecipe::Blend {
                            yaw: 0.0,
                            pitch: -0.35,
                            roll: 0.12,
                        },
                        ..Default::default()
                    },
                ),
                Phase::new(
                    "cruise",
                    0.3,
                    0.8,
                    Easing::QuadOut,
                    MotionRecipe {
                        position: Vec3::new(0.0, 8.0, 24.0),
                        fov: 82.0,
                        exposure: 1.6,
                        drift: 2.5,
                        drift_frequency: 0.35,
                        shake: 0.25,
                        orientation: OrientationRecipe::Blend {
                            yaw: 0.0,
                            pitch: -0.3,
                            roll: -0.08,
                        },
                    },
                ),
                Phase::new(
                    "arrive",
                    0.8,
                    1.0,
                    Easing::SineInOut,
                    MotionRecipe {
                        position: Vec3::from_array(DETAIL_CAMERA_POSITION),
                        fov: DETAIL_FOV,
                        exposure: BASE_EXPOSURE,
                        orientation: OrientationRecipe::LookAtOrigin { damping: 0.08 },
                        ..Default::default()
                    },
                ),
            ],
        }
    }
}

impl TransitionTuning {
    pub fn validate(&self) -> Result<()> {
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(ConfigError::InvalidRate(self.rate));
        }
        PhaseSchedule::new(self.phases.clone())?;
        for phase in &self.phases {
            let recipe = &phase.recipe;
            let fail = |what: &str| Err(ConfigError::rig(format!("phase `{}` {what}", phase.id)));
            if !recipe.position.is_finite() || !(recipe.fov > 0.0 && recipe.fov < 180.0) {
                return fail("needs a finite position and a fov in (0, 180)");
            }
            if !(recipe.exposure.is_finite() && recipe.exposure >= 0.0) {
                return fail("exposure must be finite and non-negative");
            }
            for (name, value) in [
                ("drift", recipe.drift),
                ("drift_frequency", recipe.drift_frequency),
                ("shake", recipe.shake),
            ] {
                if !(value.is_finite() && value >= 0.0) {
                    return fail(&format!("{name} must be finite and non-negative, found {value}"));
                }
            }
            match recipe.orientation {
                OrientationRecipe::Blend { yaw, pitch, roll } => {
                    if !(yaw.is_finite() && pitch.is_finite() && roll.is_finite()) {
                        return fail("orientation angles must be finite");
                    }
                }
                OrientationRecipe::LookAtOrigin { damping } => {
                    if !(damping > 0.0 && damping <= 1.0) {
                        return fail(&format!("damping must be in (0, 1], found {damping}"));
                    }
                }
            }
        }
        for (name, span) in [("fade_in", self.fade_in), ("fade_out", self.fade_out)] {
            if !(0.0..=1.0).contains(&span) {
                return Err(ConfigError::layer("transition", format!("{name} must be in [0, 1], found {span}")));
            }
        }
        Ok(())
    }

    /// Visibility of transition-only layers at a given progress
    pub fn layer_fade(&self, progress: f32) -> f32 {
        let fade_in = if self.fade_in > 0.0 {
            (progress / self.fade_in).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let fade_out = if self.fade_out > 0.0 {
            ((1.0 - progress) / self.fade_out).clamp(0.0, 1.0)
        } else {
            1.0
        };
        fade_in * fade_out
    }
}

/// Free-roam orbit limits and feel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreeRoamTuning {
    pub min_distance: f32,
    pub max_distance: f32,
    /// Radians
    pub min_elevation: f32,
    pub max_elevation: f32,
    /// Radians per pixel
    pub rotation_speed: f32,
    /// World units per zoom unit
    pub zoom_speed: f32,
    /// Per-60Hz-frame retention (0 = instant, closer to 1 = floatier)
    pub damping: f32,
}

impl Default for FreeRoamTuning {
    fn default() -> Self {
        Self {
            min_distance: 6.0,
            max_distance: 40.0,
            min_elevation: -1.2,
            max_elevation: 1.2,
            rotation_speed: 0.005,
            zoom_speed: 0.02,
            damping: 0.85,
        }
    }
}

/// Camera rig constants
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigTuning {
    pub primary_position: Vec3,
    pub primary_fov: f32,
    pub primary_exposure: f32,
    /// Seconds for the glide back to the primary view
    pub reset_duration: f32,
    /// Global multiplier on recipe shake
    pub shake_scale: f32,
    pub free_roam: FreeRoamTuning,
}

impl Default for RigTuning {
    fn default() -> Self {
        Self {
            primary_position: Vec3::from_array(PRIMARY_CAMERA_POSITION),
            primary_fov: PRIMARY_FOV,
            primary_exposure: BASE_EXPOSURE,
            reset_duration: 1.6,
            shake_scale: 1.0,
            free_roam: FreeRoamTuning::default(),
        }
    }
}

impl RigTuning {
    /// Canonical transform the primary view rests at
    pub fn primary_transform(&self) -> CameraTransform {
        CameraTransform::looking_at_origin(self.primary_position, self.primary_fov, self.primary_exposure)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.primary_position.is_finite() || self.primary_position.length_squared() < 1e-6 {
            return Err(ConfigError::rig("primary position must be finite and away from the origin"));
        }
        if !(self.primary_fov > 0.0 && self.primary_fov < 180.0) {
            return Err(ConfigError::rig(format!("fov must be in (0, 180), found {}", self.primary_fov)));
        }
        if !self.primary_exposure.is_finite() || self.primary_exposure < 0.0 {
            return Err(ConfigError::rig("exposure must be finite and non-negative"));
        }
        if !self.reset_duration.is_finite() || self.reset_duration <= 0.0 {
            return Err(ConfigError::rig(format!(
                "reset duration must be positive, found {}",
                self.reset_duration
            )));
        }
        if !self.shake_scale.is_finite() || self.shake_scale < 0.0 {
            return Err(ConfigError::rig("shake scale must be non-negative"));
        }

        let roam = &self.free_roam;
        if !(roam.min_distance > 0.0 && roam.min_distance <= roam.max_distance && roam.max_distance.is_finite()) {
            return Err(ConfigError::rig(format!(
                "free-roam distance range [{}, {}] is invalid",
                roam.min_distance, roam.max_distance
            )));
        }
        if !(roam.min_elevation <= roam.max_elevation
            && roam.min_elevation > -FRAC_PI_2
            && roam.max_elevation < FRAC_PI_2)
        {
            return Err(ConfigError::rig("free-roam elevation range must sit inside (-pi/2, pi/2)"));
        }
        if !(0.0..1.0).contains(&roam.damping) {
            return Err(ConfigError::rig(format!("free-roam damping must be in [0, 1), found {}", roam.damping)));
        }
        if !(roam.rotation_speed >= 0.0 && roam.zoom_speed >= 0.0) {
            return Err(ConfigError::rig("free-roam speeds must be non-negative"));
        }
        Ok(())
    }
}

/// One particle layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerConfig {
    pub name: String,
    pub count: usize,
    pub distribution: Distribution,
    pub policy: BoundaryPolicy,
    /// Random velocity magnitude per axis (units per 60 Hz frame)
    pub speed: f32,
    /// Directed velocity added on top, scaled per particle by 0.5..1.5
    #[serde(default)]
    pub axis_velocity: Vec3,
    /// Min and max point size
    pub size: [f32; 2],
    /// Particle colors are sampled between these two
    pub colors: [Vec3; 2],
    pub opacity: f32,
    #[serde(default)]
    pub acceleration: Option<Acceleration>,
    #[serde(default)]
    pub breathing: Option<Breathing>,
    pub seed: u64,
}

impl LayerConfig {
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: String| Err(ConfigError::layer(&self.name, reason));

        match self.distribution {
            Distribution::Shell {
                inner_radius,
                outer_radius,
            } => {
                if !(inner_radius >= 0.0 && inner_radius <= outer_radius && outer_radius.is_finite()) {
                    return fail(format!("shell radii [{inner_radius}, {outer_radius}] are invalid"));
                }
            }
            Distribution::Tube {
                inner_radius,
                outer_radius,
                far_z,
                near_z,
            } => {
                if !(inner_radius >= 0.0 && inner_radius <= outer_radius && outer_radius.is_finite()) {
                    return fail(format!("tube radii [{inner_radius}, {outer_radius}] are invalid"));
                }
                if !(far_z < near_z && far_z.is_finite() && near_z.is_finite()) {
                    return fail(format!("tube far end {far_z} must lie behind near end {near_z}"));
                }
            }
        }

        match self.policy {
            BoundaryPolicy::ReflectDamp { bound, damping } => {
                if !(bound > 0.0 && bound.is_finite()) {
                    return fail(format!("bound must be positive, found {bound}"));
                }
                if !(damping > -1.0 && damping < 0.0) {
                    return fail(format!("damping must be in (-1, 0), found {damping}"));
                }
                // Shell spawns must start inside the bounce volume
                if let Distribution::Shell { outer_radius, .. } = self.distribution {
                    if outer_radius > bound {
                        return fail(format!("shell outer radius {outer_radius} lies beyond bound {bound}"));
                    }
                }
            }
            BoundaryPolicy::Recycle => {
                if !matches!(self.distribution, Distribution::Tube { .. }) {
                    return fail("recycling needs a tube distribution".to_string());
                }
                // Slowest particle: half the axis speed minus full jitter
                if self.axis_velocity.z * 0.5 <= self.speed {
                    return fail("recycled particles must always travel toward +Z".to_string());
                }
            }
        }

        if !(self.speed >= 0.0 && self.speed.is_finite()) || !self.axis_velocity.is_finite() {
            return fail("velocity parameters must be finite and non-negative".to_string());
        }
        let [min_size, max_size] = self.size;
        if !(min_size >= 0.0 && min_size <= max_size && max_size.is_finite()) {
            return fail(format!("size range [{min_size}, {max_size}] is invalid"));
        }
        if !self.colors.iter().all(|c| c.is_finite()) {
            return fail("colors must be finite".to_string());
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return fail(format!("opacity must be in [0, 1], found {}", self.opacity));
        }
        if let Some(ramp) = self.acceleration {
            if !(ramp.rate.is_finite() && ramp.rate >= 0.0 && ramp.max_multiplier >= 1.0 && ramp.max_multiplier.is_finite()) {
                return fail("acceleration needs rate >= 0 and max multiplier >= 1".to_string());
            }
        }
        if let Some(breathing) = self.breathing {
            if !((0.0..=1.0).contains(&breathing.amplitude)
                && breathing.frequency.is_finite()
                && breathing.frequency >= 0.0)
            {
                return fail("breathing needs amplitude in [0, 1] and a finite frequency >= 0".to_string());
            }
        }
        Ok(())
    }
}

/// The full layer roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerTunings {
    /// Primary view backdrop
    pub starfield: LayerConfig,
    /// Transition only: fast streaks rushing past
    pub warp_streaks: LayerConfig,
    /// Transition only: slower, wider haze
    pub tunnel_dust: LayerConfig,
    /// Detail view ambient motes
    pub ambient_dust: LayerConfig,
    /// Detail view backdrop
    pub detail_stars: LayerConfig,
}

impl LayerTunings {
    pub fn iter(&self) -> impl Iterator<Item = &LayerConfig> {
        [
            &self.starfield,
            &self.warp_streaks,
            &self.tunnel_dust,
            &self.ambient_dust,
            &self.detail_stars,
        ]
        .into_iter()
    }
}

impl Default for LayerTunings {
    fn default() -> Self {
        Self {
            starfield: LayerConfig {
                name: "starfield".into(),
                count: 1500,
                distribution: Distribution::Shell {
                    inner_radius: 150.0,
                    outer_radius: 400.0,
                },
                policy: BoundaryPolicy::ReflectDamp {
                    bound: 400.0,
                    damping: -0.9,
                },
                speed: 0.01,
                axis_velocity: Vec3::ZERO,
                size: [0.4, 1.6],
                colors: [Vec3::new(1.0, 1.0, 1.0), Vec3::new(0.7, 0.8, 1.0)],
                opacity: 0.9,
                acceleration: None,
                breathing: Some(Breathing {
                    frequency: 0.1,
                    amplitude: 0.25,
                }),
                seed: 1,
            },
            warp_streaks: LayerConfig {
                name: "warp_streaks".into(),
                count: 800,
                distribution: Distribution::Tube {
                    inner_radius: 3.0,
                    outer_radius: 30.0,
                    far_z: -400.0,
                    near_z: 40.0,
                },
                policy: BoundaryPolicy::Recycle,
                speed: 0.2,
                axis_velocity: Vec3::new(0.0, 0.0, 3.0),
                size: [0.2, 0.8],
                colors: [Vec3::new(0.6, 0.8, 1.0), Vec3::new(1.0, 1.0, 1.0)],
                opacity: 0.85,
                acceleration: Some(Acceleration {
                    rate: 0.9,
                    max_multiplier: 4.0,
                }),
                breathing: None,
                seed: 2,
            },
            tunnel_dust: LayerConfig {
                name: "tunnel_dust".into(),
                count: 400,
                distribution: Distribution::Tube {
                    inner_radius: 12.0,
                    outer_radius: 45.0,
                    far_z: -300.0,
                    near_z: 30.0,
                },
                policy: BoundaryPolicy::Recycle,
                speed: 0.1,
                axis_velocity: Vec3::new(0.0, 0.0, 1.2),
                size: [1.0, 3.0],
                colors: [Vec3::new(0.55, 0.3, 0.9), Vec3::new(0.2, 0.8, 0.8)],
                opacity: 0.45,
                acceleration: Some(Acceleration {
                    rate: 0.5,
                    max_multiplier: 2.5,
                }),
                breathing: Some(Breathing {
                    frequency: 0.5,
                    amplitude: 0.3,
                }),
                seed: 3,
            },
            ambient_dust: LayerConfig {
                name: "ambient_dust".into(),
                count: 600,
                distribution: Distribution::Shell {
                    inner_radius: 8.0,
                    outer_radius: 40.0,
                },
                policy: BoundaryPolicy::ReflectDamp {
                    bound: 40.0,
                    damping: -0.9,
                },
                speed: 0.03,
                axis_velocity: Vec3::ZERO,
                size: [0.3, 1.2],
                colors: [Vec3::new(1.0, 0.85, 0.6), Vec3::new(1.0, 0.6, 0.4)],
                opacity: 0.6,
                acceleration: None,
                breathing: Some(Breathing {
                    frequency: 0.2,
                    amplitude: 0.35,
                }),
                seed: 4,
            },
            detail_stars: LayerConfig {
                name: "detail_stars".into(),
                count: 1200,
                distribution: Distribution::Shell {
                    inner_radius: 120.0,
                    outer_radius: 300.0,
                },
                policy: BoundaryPolicy::ReflectDamp {
                    bound: 300.0,
                    damping: -0.9,
                },
                speed: 0.005,
                axis_velocity: Vec3::ZERO,
                size: [0.5, 1.5],
                colors: [Vec3::new(0.9, 0.9, 1.0), Vec3::new(1.0, 0.95, 0.8)],
                opacity: 0.8,
                acceleration: None,
                breathing: Some(Breathing {
                    frequency: 0.05,
                    amplitude: 0.2,
                }),
                seed: 5,
            },
        }
    }
}

/// One orbiting subject
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyTuning {
    pub orbit_radius: f32,
    /// Seconds per revolution
    pub period: f32,
    /// Starting angle (radians)
    #[serde(default)]
    pub phase: f32,
    /// Orbit plane tilt about X (radians)
    #[serde(default)]
    pub inclination: f32,
    /// Seconds per spin; 0 = no spin
    #[serde(default)]
    pub spin_period: f32,
    pub size: f32,
}

/// Primary view orbits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitTuning {
    /// Global speed multiplier
    pub time_scale: f32,
    pub bodies: Vec<BodyTuning>,
}

impl Default for OrbitTuning {
    fn default() -> Self {
        let body = |orbit_radius: f32, period: f32, phase: f32, inclination: f32, size: f32| BodyTuning {
            orbit_radius,
            period,
            phase,
            inclination,
            spin_period: period / 8.0,
            size,
        };
        Self {
            time_scale: 1.0,
            bodies: vec![
                body(12.0, 20.0, 0.0, 0.02, 0.8),
                body(18.0, 32.0, 1.1, -0.03, 1.2),
                body(25.0, 45.0, 2.4, 0.05, 1.4),
                body(33.0, 60.0, 3.9, -0.02, 1.0),
                body(42.0, 80.0, 5.0, 0.04, 2.4),
                body(52.0, 110.0, 0.7, -0.05, 2.0),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        Tuning::default().validate().unwrap();
    }

    #[test]
    fn test_json_round_trip_keeps_defaults() {
        let json = Tuning::default().to_json().unwrap();
        let parsed = Tuning::from_json(&json).unwrap();
        assert_eq!(parsed, Tuning::default());
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let tuning = Tuning::from_json(r#"{ "rig": { "primary_position": [0, 10, 50], "primary_fov": 55, "primary_exposure": 1, "reset_duration": 2, "shake_scale": 0, "free_roam": { "min_distance": 5, "max_distance": 30, "min_elevation": -1, "max_elevation": 1, "rotation_speed": 0.01, "zoom_speed": 0.1, "damping": 0.8 } } }"#)
            .unwrap();
        assert_eq!(tuning.rig.reset_duration, 2.0);
        assert_eq!(tuning.transition, TransitionTuning::default());
    }

    #[test]
    fn test_gap_in_phases_rejected() {
        let mut tuning = Tuning::default();
        tuning.transition.phases[1].lower = 0.35;
        assert!(matches!(
            tuning.validate(),
            Err(ConfigError::PhaseDiscontinuity { .. })
        ));
    }

    #[test]
    fn test_non_finite_recipe_rejected() {
        for poison in [f32::NAN, f32::INFINITY, -1.0] {
            let mut tuning = Tuning::default();
            tuning.transition.phases[1].recipe.drift = poison;
            assert!(matches!(tuning.validate(), Err(ConfigError::InvalidRig(_))), "drift {poison}");

            let mut tuning = Tuning::default();
            tuning.transition.phases[1].recipe.drift_frequency = poison;
            assert!(matches!(tuning.validate(), Err(ConfigError::InvalidRig(_))), "drift_frequency {poison}");

            let mut tuning = Tuning::default();
            tuning.transition.phases[1].recipe.shake = poison;
            assert!(matches!(tuning.validate(), Err(ConfigError::InvalidRig(_))), "shake {poison}");
        }

        let mut tuning = Tuning::default();
        tuning.transition.phases[0].recipe.orientation = OrientationRecipe::Blend {
            yaw: f32::NAN,
            pitch: 0.0,
            roll: 0.0,
        };
        assert!(matches!(tuning.validate(), Err(ConfigError::InvalidRig(_))));
    }

    #[test]
    fn test_infinite_breathing_rejected() {
        let mut tuning = Tuning::default();
        tuning.layers.ambient_dust.breathing = Some(Breathing {
            frequency: f32::INFINITY,
            amplitude: 0.3,
        });
        assert!(matches!(tuning.validate(), Err(ConfigError::InvalidLayer { .. })));
    }

    #[test]
    fn test_shell_beyond_bound_rejected() {
        let mut tuning = Tuning::default();
        tuning.layers.ambient_dust.distribution = Distribution::Shell {
            inner_radius: 8.0,
            outer_radius: 60.0,
        };
        assert!(matches!(tuning.validate(), Err(ConfigError::InvalidLayer { .. })));
    }

    #[test]
    fn test_negative_count_rejected_by_parser() {
        let mut value = serde_json::to_value(Tuning::default()).unwrap();
        value["layers"]["starfield"]["count"] = serde_json::json!(-5);
        let json = serde_json::to_string(&value).unwrap();
        assert!(matches!(Tuning::from_json(&json), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_layer_fade_envelope() {
        let transition = TransitionTuning::default();
        assert_eq!(transition.layer_fade(0.0), 0.0);
        assert_eq!(transition.layer_fade(0.5), 1.0);
        assert_eq!(transition.layer_fade(1.0), 0.0);
        assert!(transition.layer_fade(0.05) > 0.0 && transition.layer_fade(0.05) < 1.0);
    }
}
