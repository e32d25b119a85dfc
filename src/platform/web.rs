//! Browser bridge
//!
//! The page owns the render loop and DOM events; it calls into `WebScene`
//! once per animation frame and whenever the user clicks, drags or scrolls.

use wasm_bindgen::prelude::*;

use crate::consts::MAX_FRAME_DELTA;
use crate::renderer::ParticleInstance;
use crate::settings::Settings;
use crate::sim::SceneDirector;
use crate::tuning::Tuning;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Orrery (web) starting...");
}

/// Scene handle exported to JavaScript
#[wasm_bindgen]
pub struct WebScene {
    director: SceneDirector,
}

#[wasm_bindgen]
impl WebScene {
    /// Build from an optional tuning JSON string. Settings come from LocalStorage.
    #[wasm_bindgen(constructor)]
    pub fn new(tuning_json: Option<String>) -> Result<WebScene, JsError> {
        let tuning = match tuning_json {
            Some(json) => Tuning::from_json(&json)?,
            None => Tuning::default(),
        };
        let director = SceneDirector::new(tuning, Settings::load())?;
        Ok(Self { director })
    }

    /// Frame delta in seconds, once per animation frame
    pub fn update(&mut self, delta_seconds: f32) {
        // A backgrounded tab reports one huge frame on return
        self.director.update(delta_seconds.min(MAX_FRAME_DELTA));
    }

    pub fn activate_transition(&mut self) -> bool {
        self.director.activate_transition()
    }

    pub fn request_back(&mut self) -> bool {
        self.director.request_back()
    }

    pub fn orbit_delta(&mut self, dx: f32, dy: f32) {
        self.director.orbit_delta(dx, dy);
    }

    pub fn zoom_delta(&mut self, dz: f32) {
        self.director.zoom_delta(dz);
    }

    pub fn mode(&self) -> String {
        self.director.mode().as_str().to_string()
    }

    pub fn progress(&self) -> f32 {
        self.director.transition_state().progress
    }

    pub fn background_time(&self) -> f32 {
        self.director.background_time()
    }

    /// [x, y, z]
    pub fn camera_position(&self) -> Vec<f32> {
        self.director.camera().position.to_array().to_vec()
    }

    /// Quaternion [x, y, z, w]
    pub fn camera_orientation(&self) -> Vec<f32> {
        self.director.camera().orientation.to_array().to_vec()
    }

    pub fn camera_fov(&self) -> f32 {
        self.director.camera().fov
    }

    pub fn camera_exposure(&self) -> f32 {
        self.director.camera().exposure
    }

    /// Names of the armed layers, in draw order
    pub fn layer_names(&self) -> Vec<String> {
        self.director.armed_layers().map(|l| l.name().to_string()).collect()
    }

    /// Packed instances for one layer: 8 floats each (x, y, z, size, r, g, b, alpha)
    pub fn layer_instances(&self, name: &str) -> Vec<f32> {
        let Some(layer) = self.director.layer(name) else {
            return Vec::new();
        };
        let mut instances = Vec::with_capacity(layer.len());
        layer.write_instances(&mut instances);
        ParticleInstance::as_floats(&instances).to_vec()
    }

    /// Orbiting subjects: 5 floats each (x, y, z, spin, size)
    pub fn bodies(&self) -> Vec<f32> {
        self.director
            .bodies()
            .iter()
            .flat_map(|b| [b.position.x, b.position.y, b.position.z, b.spin, b.tuning.size])
            .collect()
    }

    /// Drain notifications as event names ("transition_complete", "reset_complete", ...)
    pub fn drain_events(&mut self) -> Vec<String> {
        self.director
            .drain_events()
            .iter()
            .map(|e| e.name().to_string())
            .collect()
    }

    pub fn set_reduced_motion(&mut self, reduced: bool) {
        let mut settings = self.director.settings().clone();
        settings.reduced_motion = reduced;
        settings.save();
        self.director.apply_settings(settings);
    }
}
