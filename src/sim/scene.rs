//! Scene composition
//!
//! `SceneDirector` owns the view mode and decides which particle layers,
//! camera mode and scheduler run are armed. It is also the per-frame driver:
//! `update` runs the stages in a fixed order so later stages see this
//! frame's values from earlier ones.
//!
//! ```text
//! Primary --activate--> Transitioning --scheduler done--> Detail
//!    ^                                                     |
//!    +----reset done---- ResettingToPrimary <----back------+
//! ```

use serde::{Deserialize, Serialize};

use super::orbit::{OrbitingBody, SolarSystem};
use super::particles::ParticleLayer;
use super::phase::{PhaseSchedule, PhaseScheduler, TransitionState};
use super::rig::{CameraRig, CameraTransform};
use crate::error::Result;
use crate::renderer::{BodyView, CameraUniform, FrameSnapshot, LayerView};
use crate::sanitize_delta;
use crate::settings::Settings;
use crate::tuning::{TransitionTuning, Tuning};

/// Top-level, mutually exclusive scene state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewMode {
    /// Solar system overview
    Primary,
    /// Cinematic hand-off into the detail view
    Transitioning,
    /// Detail view, user orbiting the subject
    Detail,
    /// Camera gliding back to the overview
    ResettingToPrimary,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Primary => "primary",
            ViewMode::Transitioning => "transitioning",
            ViewMode::Detail => "detail",
            ViewMode::ResettingToPrimary => "resetting_to_primary",
        }
    }

    /// Whether the starfield and orbits run. The reset glide arms the camera only.
    pub fn arms_primary(&self) -> bool {
        matches!(self, ViewMode::Primary)
    }

    /// Whether the orbiting subjects are on screen (frozen while the camera glides back)
    pub fn shows_bodies(&self) -> bool {
        matches!(self, ViewMode::Primary | ViewMode::ResettingToPrimary)
    }
}

/// Notifications for the UI collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SceneEvent {
    ModeChanged { from: ViewMode, to: ViewMode },
    TransitionComplete,
    ResetComplete,
}

impl SceneEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SceneEvent::ModeChanged { .. } => "mode_changed",
            SceneEvent::TransitionComplete => "transition_complete",
            SceneEvent::ResetComplete => "reset_complete",
        }
    }
}

/// Which view a particle layer belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerRole {
    Primary,
    Transition,
    Detail,
}

impl LayerRole {
    fn armed_in(&self, mode: ViewMode) -> bool {
        match self {
            LayerRole::Primary => mode.arms_primary(),
            LayerRole::Transition => mode == ViewMode::Transitioning,
            LayerRole::Detail => mode == ViewMode::Detail,
        }
    }
}

#[derive(Debug, Clone)]
struct LayerSlot {
    role: LayerRole,
    /// Count before quality scaling
    tuned_count: usize,
    layer: ParticleLayer,
    armed: bool,
}

/// Single source of truth for the view mode and everything it arms
#[derive(Debug)]
pub struct SceneDirector {
    mode: ViewMode,
    settings: Settings,
    transition: TransitionTuning,
    scheduler: PhaseScheduler,
    rig: CameraRig,
    shake_scale: f32,
    slots: Vec<LayerSlot>,
    solar: SolarSystem,
    background_time: f32,
    events: Vec<SceneEvent>,
    frame: u64,
}

impl SceneDirector {
    pub fn new(tuning: Tuning, settings: Settings) -> Result<Self> {
        tuning.transition.validate()?;
        let schedule = PhaseSchedule::new(tuning.transition.phases.clone())?;
        let scheduler = PhaseScheduler::new(schedule, tuning.transition.rate)?;
        let rig = CameraRig::new(tuning.rig)?;
        let solar = SolarSystem::new(&tuning.orbits)?;

        let roster = [
            (LayerRole::Primary, &tuning.layers.starfield),
            (LayerRole::Transition, &tuning.layers.warp_streaks),
            (LayerRole::Transition, &tuning.layers.tunnel_dust),
            (LayerRole::Detail, &tuning.layers.ambient_dust),
            (LayerRole::Detail, &tuning.layers.detail_stars),
        ];
        let mut slots = Vec::with_capacity(roster.len());
        for (role, config) in roster {
            let mut config = config.clone();
            let tuned_count = config.count;
            config.count = settings.particle_count(tuned_count);
            slots.push(LayerSlot {
                role,
                tuned_count,
                layer: ParticleLayer::new(config)?,
                armed: role.armed_in(ViewMode::Primary),
            });
        }

        let mut director = Self {
            mode: ViewMode::Primary,
            settings: Settings::default(),
            transition: tuning.transition,
            scheduler,
            rig,
            shake_scale: tuning.rig.shake_scale,
            slots,
            solar,
            background_time: 0.0,
            events: Vec::new(),
            frame: 0,
        };
        director.apply_settings(settings);

        log::info!(
            "Scene ready: {} layers, {} particles, {} bodies, quality {}",
            director.slots.len(),
            director.slots.iter().map(|s| s.layer.len()).sum::<usize>(),
            director.solar.bodies().len(),
            director.settings.quality.as_str()
        );
        Ok(director)
    }

    /// Apply new viewer settings. Layers whose particle count changes are re-initialized,
    /// except transition layers mid-run, which pick up the new count on the next run.
    pub fn apply_settings(&mut self, settings: Settings) {
        self.rig.set_shake_scale(if settings.effective_camera_shake() {
            self.shake_scale
        } else {
            0.0
        });
        let running = self.mode == ViewMode::Transitioning;
        for slot in &mut self.slots {
            let count = settings.particle_count(slot.tuned_count);
            if count != slot.layer.len() {
                if running && slot.role == LayerRole::Transition {
                    log::debug!("Layer {} resize to {count} deferred until the next transition", slot.layer.name());
                } else {
                    slot.layer.resize(count);
                }
            }
            slot.layer.set_breathing_enabled(settings.effective_breathing());
        }
        self.settings = settings;
    }

    /// Advance one displayed frame.
    ///
    /// Stage order: clock/scheduler, particles, orbits, camera, then mode
    /// switches triggered by completions seen this frame.
    pub fn update(&mut self, frame_delta: f32) {
        let delta = sanitize_delta(frame_delta);
        if !frame_delta.is_finite() || frame_delta < 0.0 {
            log::warn!("Frame {}: dropped bad delta {frame_delta}", self.frame);
        }
        self.frame += 1;
        self.background_time += delta;

        let sample = if self.mode == ViewMode::Transitioning {
            self.scheduler.advance(delta)
        } else {
            None
        };

        if let Some(sample) = &sample {
            let fade = self.transition.layer_fade(sample.progress);
            for slot in self.slots.iter_mut().filter(|s| s.role == LayerRole::Transition) {
                slot.layer.set_fade(fade);
            }
        }
        for slot in self.slots.iter_mut().filter(|s| s.armed) {
            slot.layer.step(delta);
        }
        if self.mode.arms_primary() {
            self.solar.update(delta);
        }

        let rig = self
            .rig
            .update(delta, sample.as_ref(), self.scheduler.schedule().phases());

        if sample.is_some_and(|s| s.just_completed) {
            log::info!("Transition complete after {:.2}s", sample.map_or(0.0, |s| s.elapsed));
            self.events.push(SceneEvent::TransitionComplete);
            self.enter(ViewMode::Detail);
        }
        if rig.reset_completed && self.mode == ViewMode::ResettingToPrimary {
            log::info!("Camera back at the primary view");
            self.events.push(SceneEvent::ResetComplete);
            self.enter(ViewMode::Primary);
        }
    }

    /// User picked a subject. Only honoured from the primary view.
    pub fn activate_transition(&mut self) -> bool {
        if self.mode != ViewMode::Primary {
            log::debug!("activate_transition ignored in {}", self.mode.as_str());
            return false;
        }
        self.enter(ViewMode::Transitioning);
        true
    }

    /// User asked to go back. Only honoured from the detail view.
    pub fn request_back(&mut self) -> bool {
        if self.mode != ViewMode::Detail {
            log::debug!("request_back ignored in {}", self.mode.as_str());
            return false;
        }
        self.enter(ViewMode::ResettingToPrimary);
        true
    }

    /// Orbit drag in screen pixels (detail view only)
    pub fn orbit_delta(&mut self, dx: f32, dy: f32) {
        if self.mode == ViewMode::Detail {
            self.rig.orbit_delta(dx, dy);
        } else {
            log::debug!("orbit_delta ignored in {}", self.mode.as_str());
        }
    }

    /// Zoom input, positive moves away (detail view only)
    pub fn zoom_delta(&mut self, dz: f32) {
        if self.mode == ViewMode::Detail {
            self.rig.zoom_delta(dz);
        } else {
            log::debug!("zoom_delta ignored in {}", self.mode.as_str());
        }
    }

    fn enter(&mut self, next: ViewMode) {
        let from = self.mode;
        match next {
            ViewMode::Transitioning => {
                // Always a full reset, never a resume
                self.scheduler.stop();
                self.scheduler.start();
                let fade = self.transition.layer_fade(0.0);
                for slot in self.slots.iter_mut().filter(|s| s.role == LayerRole::Transition) {
                    let count = self.settings.particle_count(slot.tuned_count);
                    if count == slot.layer.len() {
                        slot.layer.reset();
                    } else {
                        slot.layer.resize(count);
                    }
                    slot.layer.set_fade(fade);
                }
                self.rig.begin_phased(self.scheduler.schedule().phases());
            }
            ViewMode::Detail => {
                self.scheduler.stop();
                for slot in self.slots.iter_mut().filter(|s| s.role == LayerRole::Detail) {
                    slot.layer.reset();
                }
                self.rig.begin_free_roam();
            }
            ViewMode::ResettingToPrimary => {
                self.scheduler.stop();
                self.rig.begin_reset();
            }
            ViewMode::Primary => {
                self.scheduler.stop();
                self.rig.hold();
            }
        }

        self.mode = next;
        for slot in &mut self.slots {
            slot.armed = slot.role.armed_in(next);
        }
        log::info!("View mode {} -> {}", from.as_str(), next.as_str());
        self.events.push(SceneEvent::ModeChanged { from, to: next });
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn camera(&self) -> &CameraTransform {
        self.rig.transform()
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn transition_state(&self) -> &TransitionState {
        self.scheduler.state()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Elapsed scene time for the procedural background
    pub fn background_time(&self) -> f32 {
        self.background_time
    }

    /// Layers armed for the current mode
    pub fn armed_layers(&self) -> impl Iterator<Item = &ParticleLayer> {
        self.slots.iter().filter(|s| s.armed).map(|s| &s.layer)
    }

    pub fn layer(&self, name: &str) -> Option<&ParticleLayer> {
        self.slots.iter().map(|s| &s.layer).find(|l| l.name() == name)
    }

    pub fn bodies(&self) -> &[OrbitingBody] {
        self.solar.bodies()
    }

    /// Take every queued notification
    pub fn drain_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }

    /// Committed state for the renderer
    pub fn snapshot(&self) -> FrameSnapshot {
        let layers = self
            .armed_layers()
            .map(|layer| {
                let mut instances = Vec::with_capacity(layer.len());
                layer.write_instances(&mut instances);
                LayerView {
                    name: layer.name().to_string(),
                    opacity: layer.opacity(),
                    size_scale: layer.size_scale(),
                    instances,
                }
            })
            .collect();
        let bodies = if self.mode.shows_bodies() {
            self.solar
                .bodies()
                .iter()
                .map(|b| BodyView {
                    position: b.position,
                    spin: b.spin,
                    size: b.tuning.size,
                })
                .collect()
        } else {
            Vec::new()
        };

        FrameSnapshot {
            mode: self.mode,
            camera: CameraUniform::from(self.rig.transform()),
            background_time: self.background_time,
            progress: if self.mode == ViewMode::Transitioning {
                self.scheduler.progress()
            } else {
                0.0
            },
            layers,
            bodies,
        }
    }
}
