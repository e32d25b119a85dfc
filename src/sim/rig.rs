//! Camera rig controller
//!
//! The only writer of the camera transform. Everything else asks the rig for
//! motion through its mode switches and input deltas.
//!
//! Modes:
//! - `Hold`: the camera sits still (primary view)
//! - `Phased`: each transition phase blends from its start keyframe toward its recipe
//! - `Reset`: fixed-duration glide back to the canonical primary transform
//! - `FreeRoam`: user orbit/zoom around the detail subject

use std::f32::consts::{PI, TAU};

use glam::{EulerRot, Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::phase::{Phase, PhaseSample};
use crate::error::Result;
use crate::tuning::{FreeRoamTuning, RigTuning};

/// Camera pose plus lens parameters, read by the renderer after each frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTransform {
    pub position: Vec3,
    pub orientation: Quat,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub exposure: f32,
}

impl CameraTransform {
    /// Camera at `position` looking at the origin
    pub fn looking_at_origin(position: Vec3, fov: f32, exposure: f32) -> Self {
        Self {
            position,
            orientation: look_toward(position, Vec3::ZERO),
            fov,
            exposure,
        }
    }

    /// Direction the camera faces (-Z in camera space)
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }
}

/// How orientation evolves during a phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrientationRecipe {
    /// Slerp from the phase's start orientation to a yaw/pitch/roll target (radians) by eased time
    Blend { yaw: f32, pitch: f32, roll: f32 },
    /// Each frame, slerp a fixed fraction toward looking at the origin
    LookAtOrigin { damping: f32 },
}

impl Default for OrientationRecipe {
    fn default() -> Self {
        OrientationRecipe::Blend {
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
        }
    }
}

/// Where a phase takes the camera by the time its eased time reaches 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionRecipe {
    pub position: Vec3,
    pub fov: f32,
    pub exposure: f32,
    /// Lateral sway amplitude (world units)
    #[serde(default)]
    pub drift: f32,
    /// Lateral sway frequency (Hz)
    #[serde(default)]
    pub drift_frequency: f32,
    /// Camera shake amplitude (world units)
    #[serde(default)]
    pub shake: f32,
    #[serde(default)]
    pub orientation: OrientationRecipe,
}

impl Default for MotionRecipe {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            fov: crate::consts::PRIMARY_FOV,
            exposure: crate::consts::BASE_EXPOSURE,
            drift: 0.0,
            drift_frequency: 0.0,
            shake: 0.0,
            orientation: OrientationRecipe::default(),
        }
    }
}

impl MotionRecipe {
    /// Target orientation for the end of the phase
    fn end_orientation(&self) -> Quat {
        match self.orientation {
            OrientationRecipe::Blend { yaw, pitch, roll } => {
                Quat::from_euler(EulerRot::YXZ, yaw, pitch, roll)
            }
            OrientationRecipe::LookAtOrigin { .. } => look_toward(self.position, Vec3::ZERO),
        }
    }

    fn keyframe(&self) -> CameraTransform {
        CameraTransform {
            position: self.position,
            orientation: self.end_orientation(),
            fov: self.fov,
            exposure: self.exposure,
        }
    }
}

/// Orbit parameters while the user is in control
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitState {
    pub target: Vec3,
    pub distance: f32,
    pub azimuth: f32,
    pub elevation: f32,
    goal_distance: f32,
    goal_azimuth: f32,
    goal_elevation: f32,
}

impl OrbitState {
    fn from_position(position: Vec3, target: Vec3, limits: &FreeRoamTuning) -> Self {
        let offset = position - target;
        let distance = offset.length().clamp(limits.min_distance, limits.max_distance);
        let azimuth = offset.x.atan2(offset.z);
        let elevation = if offset.length() > 1e-6 {
            (offset.y / offset.length()).clamp(-1.0, 1.0).asin()
        } else {
            0.0
        }
        .clamp(limits.min_elevation, limits.max_elevation);
        Self {
            target,
            distance,
            azimuth,
            elevation,
            goal_distance: distance,
            goal_azimuth: azimuth,
            goal_elevation: elevation,
        }
    }

    fn position(&self) -> Vec3 {
        let (sin_elev, cos_elev) = self.elevation.sin_cos();
        let (sin_azim, cos_azim) = self.azimuth.sin_cos();
        self.target
            + Vec3::new(
                self.distance * cos_elev * sin_azim,
                self.distance * sin_elev,
                self.distance * cos_elev * cos_azim,
            )
    }
}

/// Current rig mode with its private state
#[derive(Debug, Clone, PartialEq)]
enum RigMode {
    Hold,
    Phased { keyframes: Vec<CameraTransform> },
    Reset {
        from: CameraTransform,
        elapsed: f32,
        done: bool,
    },
    FreeRoam(OrbitState),
}

/// Public name of the active mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RigModeKind {
    Hold,
    Phased,
    Reset,
    FreeRoam,
}

/// Per-frame result of [`CameraRig::update`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RigUpdate {
    /// True only on the frame the reset glide finished
    pub reset_completed: bool,
}

/// Owns and mutates the shared camera transform
pub struct CameraRig {
    tuning: RigTuning,
    transform: CameraTransform,
    mode: RigMode,
    shake_scale: f32,
    on_reset_complete: Option<Box<dyn FnMut()>>,
}

impl std::fmt::Debug for CameraRig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraRig")
            .field("transform", &self.transform)
            .field("mode", &self.mode)
            .field("shake_scale", &self.shake_scale)
            .finish_non_exhaustive()
    }
}

impl CameraRig {
    pub fn new(tuning: RigTuning) -> Result<Self> {
        tuning.validate()?;
        let transform = tuning.primary_transform();
        Ok(Self {
            shake_scale: tuning.shake_scale,
            tuning,
            transform,
            mode: RigMode::Hold,
            on_reset_complete: None,
        })
    }

    pub fn transform(&self) -> &CameraTransform {
        &self.transform
    }

    pub fn mode(&self) -> RigModeKind {
        match self.mode {
            RigMode::Hold => RigModeKind::Hold,
            RigMode::Phased { .. } => RigModeKind::Phased,
            RigMode::Reset { .. } => RigModeKind::Reset,
            RigMode::FreeRoam(_) => RigModeKind::FreeRoam,
        }
    }

    pub fn orbit(&self) -> Option<&OrbitState> {
        match &self.mode {
            RigMode::FreeRoam(orbit) => Some(orbit),
            _ => None,
        }
    }

    /// Scale applied to recipe shake; 0 disables it
    pub fn set_shake_scale(&mut self, scale: f32) {
        self.shake_scale = if scale.is_finite() { scale.max(0.0) } else { 0.0 };
    }

    /// Callback fired once per reset, on the frame the glide finishes
    pub fn set_on_reset_complete(&mut self, callback: Box<dyn FnMut()>) {
        self.on_reset_complete = Some(callback);
    }

    /// Freeze the camera where it is
    pub fn hold(&mut self) {
        self.mode = RigMode::Hold;
    }

    /// Snap to the canonical primary transform and hold
    pub fn snap_to_primary(&mut self) {
        self.transform = self.tuning.primary_transform();
        self.mode = RigMode::Hold;
    }

    /// Enter phase-driven mode. Phase `i` starts from keyframe `i`; keyframe 0 is the current transform.
    pub fn begin_phased(&mut self, phases: &[Phase]) {
        let mut keyframes = Vec::with_capacity(phases.len());
        keyframes.push(self.transform);
        keyframes.extend(phases.iter().take(phases.len().saturating_sub(1)).map(|p| p.recipe.keyframe()));
        self.mode = RigMode::Phased { keyframes };
    }

    /// Start the glide back to the primary transform
    pub fn begin_reset(&mut self) {
        self.mode = RigMode::Reset {
            from: self.transform,
            elapsed: 0.0,
            done: false,
        };
    }

    /// Hand control to the user, orbiting the origin from the current position
    pub fn begin_free_roam(&mut self) {
        let orbit = OrbitState::from_position(self.transform.position, Vec3::ZERO, &self.tuning.free_roam);
        self.mode = RigMode::FreeRoam(orbit);
    }

    /// Orbit input in screen pixels. Ignored outside free-roam.
    pub fn orbit_delta(&mut self, dx: f32, dy: f32) {
        if !(dx.is_finite() && dy.is_finite()) {
            return;
        }
        let limits = self.tuning.free_roam;
        if let RigMode::FreeRoam(orbit) = &mut self.mode {
            orbit.goal_azimuth -= dx * limits.rotation_speed;
            orbit.goal_elevation =
                (orbit.goal_elevation + dy * limits.rotation_speed).clamp(limits.min_elevation, limits.max_elevation);
        }
    }

    /// Zoom input; positive moves away. Ignored outside free-roam.
    pub fn zoom_delta(&mut self, dz: f32) {
        if !dz.is_finite() {
            return;
        }
        let limits = self.tuning.free_roam;
        if let RigMode::FreeRoam(orbit) = &mut self.mode {
            orbit.goal_distance =
                (orbit.goal_distance + dz * limits.zoom_speed).clamp(limits.min_distance, limits.max_distance);
        }
    }

    /// Compute this frame's transform. `sample` is the scheduler output for this frame, if any.
    pub fn update(&mut self, delta: f32, sample: Option<&PhaseSample>, phases: &[Phase]) -> RigUpdate {
        let mut result = RigUpdate::default();
        match &mut self.mode {
            RigMode::Hold => {}
            RigMode::Phased { keyframes } => {
                if let Some(sample) = sample {
                    if let Some(phase) = phases.get(sample.phase_index) {
                        let start = keyframes.get(sample.phase_index).copied().unwrap_or(self.transform);
                        self.transform =
                            phased_transform(&self.transform, &start, phase, sample, self.shake_scale);
                    }
                }
            }
            RigMode::Reset { from, elapsed, done } => {
                if !*done {
                    *elapsed += delta;
                    let t = (*elapsed / self.tuning.reset_duration).clamp(0.0, 1.0);
                    let goal = self.tuning.primary_transform();
                    self.transform = blend(from, &goal, t);
                    if t >= 1.0 {
                        *done = true;
                        result.reset_completed = true;
                        if let Some(callback) = self.on_reset_complete.as_mut() {
                            callback();
                        }
                    }
                }
            }
            RigMode::FreeRoam(orbit) => {
                let limits = &self.tuning.free_roam;
                let t = 1.0 - limits.damping.powf(delta * crate::consts::REFERENCE_FPS);
                orbit.azimuth = lerp(orbit.azimuth, orbit.goal_azimuth, t);
                orbit.elevation = lerp(orbit.elevation, orbit.goal_elevation, t);
                orbit.distance = lerp(orbit.distance, orbit.goal_distance, t);

                let position = orbit.position();
                let facing = align_hemisphere(self.transform.orientation, look_toward(position, orbit.target));
                self.transform.position = position;
                self.transform.orientation = self.transform.orientation.slerp(facing, t).normalize();
            }
        }
        result
    }
}

fn phased_transform(
    current: &CameraTransform,
    start: &CameraTransform,
    phase: &Phase,
    sample: &PhaseSample,
    shake_scale: f32,
) -> CameraTransform {
    let recipe = &phase.recipe;
    let eased = sample.eased_t;
    // Sway and shake vanish at both ends of the phase so keyframes line up
    let envelope = (PI * sample.local_t).sin();

    let mut position = start.position.lerp(recipe.position, eased);
    if recipe.drift != 0.0 {
        position.x += recipe.drift * envelope * (TAU * recipe.drift_frequency * sample.elapsed).sin();
    }
    if recipe.shake != 0.0 && shake_scale > 0.0 {
        let amount = recipe.shake * shake_scale * envelope;
        position += Vec3::new(
            (sample.elapsed * 37.0).sin() * amount,
            (sample.elapsed * 29.0 + 1.3).sin() * amount,
            0.0,
        );
    }

    let orientation = match recipe.orientation {
        OrientationRecipe::Blend { .. } => {
            let goal = align_hemisphere(start.orientation, recipe.end_orientation());
            start.orientation.slerp(goal, eased)
        }
        OrientationRecipe::LookAtOrigin { damping } => {
            let goal = align_hemisphere(current.orientation, look_toward(position, Vec3::ZERO));
            current.orientation.slerp(goal, damping)
        }
    }
    .normalize();

    CameraTransform {
        position,
        orientation,
        fov: lerp(start.fov, recipe.fov, eased),
        exposure: lerp(start.exposure, recipe.exposure, eased),
    }
}

fn blend(from: &CameraTransform, to: &CameraTransform, t: f32) -> CameraTransform {
    let goal = align_hemisphere(from.orientation, to.orientation);
    CameraTransform {
        position: from.position.lerp(to.position, t),
        orientation: from.orientation.slerp(goal, t).normalize(),
        fov: lerp(from.fov, to.fov, t),
        exposure: lerp(from.exposure, to.exposure, t),
    }
}

/// Flip `goal` onto the same hemisphere as `from` so slerp takes the short arc
fn align_hemisphere(from: Quat, goal: Quat) -> Quat {
    if from.dot(goal) < 0.0 { -goal } else { goal }
}

/// Orientation of a camera at `eye` facing `target`, +Y up
pub fn look_toward(eye: Vec3, target: Vec3) -> Quat {
    let forward = (target - eye).normalize_or_zero();
    if forward == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let mut right = forward.cross(Vec3::Y);
    if right.length_squared() < 1e-8 {
        // Looking straight up or down
        right = Vec3::X;
    }
    let right = right.normalize();
    let up = right.cross(forward);
    Quat::from_mat3(&Mat3::from_cols(right, up, -forward)).normalize()
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::phase::{PhaseSchedule, PhaseScheduler};
    use crate::tuning::TransitionTuning;
    use std::cell::Cell;
    use std::rc::Rc;

    fn rig() -> CameraRig {
        CameraRig::new(RigTuning::default()).unwrap()
    }

    fn run_transition(rig: &mut CameraRig) -> PhaseScheduler {
        let tuning = TransitionTuning::default();
        let schedule = PhaseSchedule::new(tuning.phases).unwrap();
        let mut scheduler = PhaseScheduler::new(schedule, tuning.rate).unwrap();
        scheduler.start();
        rig.begin_phased(scheduler.schedule().phases());
        let dt = 1.0 / 60.0;
        while let Some(sample) = scheduler.advance(dt) {
            rig.update(dt, Some(&sample), scheduler.schedule().phases());
        }
        scheduler
    }

    #[test]
    fn test_look_toward_faces_target() {
        let eye = Vec3::new(3.0, 4.0, 10.0);
        let q = look_toward(eye, Vec3::ZERO);
        let forward = q * Vec3::NEG_Z;
        assert!(forward.dot((-eye).normalize()) > 0.9999);
        assert_eq!(look_toward(Vec3::ZERO, Vec3::ZERO), Quat::IDENTITY);
        let down = look_toward(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO) * Vec3::NEG_Z;
        assert!(down.dot(Vec3::NEG_Y) > 0.9999);
    }

    #[test]
    fn test_rejects_bad_tuning() {
        let mut tuning = RigTuning::default();
        tuning.reset_duration = 0.0;
        assert!(CameraRig::new(tuning).is_err());

        let mut tuning = RigTuning::default();
        tuning.free_roam.min_distance = 50.0;
        tuning.free_roam.max_distance = 10.0;
        assert!(CameraRig::new(tuning).is_err());
    }

    #[test]
    fn test_hold_does_not_move() {
        let mut rig = rig();
        let before = *rig.transform();
        rig.update(0.5, None, &[]);
        assert_eq!(*rig.transform(), before);
    }

    #[test]
    fn test_transition_lands_on_arrival_recipe() {
        let mut rig = rig();
        let scheduler = run_transition(&mut rig);
        let last = scheduler.schedule().phases().last().unwrap();
        let transform = rig.transform();
        assert!(transform.position.distance(last.recipe.position) < 1e-3);
        assert!((transform.fov - last.recipe.fov).abs() < 1e-3);
        assert!((transform.exposure - last.recipe.exposure).abs() < 1e-3);
        // Arrival damping has pulled the view onto the subject
        assert!(transform.forward().dot((-transform.position).normalize()) > 0.99);
    }

    #[test]
    fn test_cruise_boosts_exposure() {
        let tuning = TransitionTuning::default();
        let schedule = PhaseSchedule::new(tuning.phases).unwrap();
        let mut scheduler = PhaseScheduler::new(schedule, tuning.rate).unwrap();
        let mut rig = rig();
        scheduler.start();
        rig.begin_phased(scheduler.schedule().phases());
        let mut peak: f32 = 0.0;
        while let Some(sample) = scheduler.advance(1.0 / 60.0) {
            rig.update(1.0 / 60.0, Some(&sample), scheduler.schedule().phases());
            peak = peak.max(rig.transform().exposure);
        }
        assert!(peak > crate::consts::BASE_EXPOSURE + 0.3);
        assert!((rig.transform().exposure - crate::consts::BASE_EXPOSURE).abs() < 1e-3);
    }

    #[test]
    fn test_reset_returns_to_primary_once() {
        let fired = Rc::new(Cell::new(0));
        let mut rig = rig();
        let counter = fired.clone();
        rig.set_on_reset_complete(Box::new(move || counter.set(counter.get() + 1)));
        run_transition(&mut rig);

        rig.begin_reset();
        let mut completions = 0;
        let dt = 1.0 / 60.0;
        let frames = (RigTuning::default().reset_duration / dt) as usize + 30;
        for _ in 0..frames {
            if rig.update(dt, None, &[]).reset_completed {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
        assert_eq!(fired.get(), 1);

        let home = RigTuning::default().primary_transform();
        assert!(rig.transform().position.distance(home.position) < 1e-3);
        assert!(rig.transform().orientation.dot(home.orientation).abs() > 0.9999);
    }

    #[test]
    fn test_free_roam_respects_distance_clamps() {
        let mut rig = rig();
        run_transition(&mut rig);
        rig.begin_free_roam();
        let limits = RigTuning::default().free_roam;

        for _ in 0..200 {
            rig.zoom_delta(1000.0);
            rig.update(1.0 / 60.0, None, &[]);
        }
        assert!(rig.transform().position.length() <= limits.max_distance + 1e-3);

        for _ in 0..200 {
            rig.zoom_delta(-1000.0);
            rig.update(1.0 / 60.0, None, &[]);
        }
        assert!(rig.transform().position.length() >= limits.min_distance - 1e-3);
    }

    #[test]
    fn test_free_roam_orbit_moves_camera() {
        let mut rig = rig();
        run_transition(&mut rig);
        rig.begin_free_roam();
        let before = rig.transform().position;
        rig.orbit_delta(200.0, 0.0);
        for _ in 0..120 {
            rig.update(1.0 / 60.0, None, &[]);
        }
        let after = rig.transform().position;
        assert!(before.distance(after) > 1.0);
        assert!((before.length() - after.length()).abs() < 0.5);

        rig.orbit_delta(f32::NAN, 3.0);
        rig.update(1.0 / 60.0, None, &[]);
        assert!(rig.transform().position.is_finite());
    }

    #[test]
    fn test_input_ignored_outside_free_roam() {
        let mut rig = rig();
        let before = *rig.transform();
        rig.orbit_delta(50.0, 50.0);
        rig.zoom_delta(10.0);
        rig.update(1.0 / 60.0, None, &[]);
        assert_eq!(*rig.transform(), before);
    }
}
