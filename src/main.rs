//! Orrery entry point
//!
//! On the web the page drives `platform::web::WebScene`. Natively there is no
//! renderer, so this replays a scripted session headlessly and logs what the
//! backend would have drawn.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Orrery (native) starting...");

    if let Err(err) = session::run() {
        log::error!("Scene failed to start: {err}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::wasm_start, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod session {
    use orrery::sim::{SceneDirector, SceneEvent, ViewMode};
    use orrery::{ConfigError, Settings, Tuning};

    const FRAME_DT: f32 = 1.0 / 60.0;
    /// Bail out if a mode never finishes
    const MAX_FRAMES_PER_STEP: u32 = 60 * 30;

    /// One scripted user action, applied at the start of a frame
    enum Step {
        Idle(u32),
        Activate,
        UntilMode(ViewMode),
        Orbit { dx: f32, dy: f32, frames: u32 },
        Zoom { dz: f32, frames: u32 },
        Back,
    }

    pub fn run() -> Result<(), ConfigError> {
        let tuning = match std::env::var("ORRERY_TUNING") {
            Ok(path) => match std::fs::read_to_string(&path) {
                Ok(json) => Tuning::from_json(&json)?,
                Err(err) => {
                    log::warn!("Cannot read tuning file {path}: {err}, using defaults");
                    Tuning::default()
                }
            },
            Err(_) => Tuning::default(),
        };
        let mut director = SceneDirector::new(tuning, Settings::load())?;

        let script = [
            Step::Idle(120),
            Step::Activate,
            Step::UntilMode(ViewMode::Detail),
            Step::Orbit {
                dx: 12.0,
                dy: -3.0,
                frames: 90,
            },
            Step::Zoom { dz: 40.0, frames: 30 },
            Step::Idle(60),
            Step::Back,
            Step::UntilMode(ViewMode::Primary),
            Step::Idle(30),
        ];

        let mut frames = 0u64;
        for step in &script {
            match *step {
                Step::Idle(count) => {
                    for _ in 0..count {
                        tick(&mut director, &mut frames);
                    }
                }
                Step::Activate => {
                    director.activate_transition();
                }
                Step::Back => {
                    director.request_back();
                }
                Step::UntilMode(mode) => {
                    let mut waited = 0;
                    while director.mode() != mode && waited < MAX_FRAMES_PER_STEP {
                        tick(&mut director, &mut frames);
                        waited += 1;
                    }
                    if director.mode() != mode {
                        log::warn!("Gave up waiting for {} after {waited} frames", mode.as_str());
                    }
                }
                Step::Orbit { dx, dy, frames: count } => {
                    for _ in 0..count {
                        director.orbit_delta(dx, dy);
                        tick(&mut director, &mut frames);
                    }
                }
                Step::Zoom { dz, frames: count } => {
                    for _ in 0..count {
                        director.zoom_delta(dz);
                        tick(&mut director, &mut frames);
                    }
                }
            }
        }

        let camera = director.camera();
        log::info!(
            "Session done after {frames} frames ({:.1}s): camera at {:?}, fov {:.1}, exposure {:.2}",
            director.background_time(),
            camera.position,
            camera.fov,
            camera.exposure
        );
        Ok(())
    }

    fn tick(director: &mut SceneDirector, frames: &mut u64) {
        director.update(FRAME_DT);
        *frames += 1;

        for event in director.drain_events() {
            match event {
                SceneEvent::ModeChanged { from, to } => {
                    let snapshot = director.snapshot();
                    log::info!(
                        "Frame {frames}: {} -> {} ({} particles in {} layers)",
                        from.as_str(),
                        to.as_str(),
                        snapshot.particle_count(),
                        snapshot.layers.len()
                    );
                }
                SceneEvent::TransitionComplete => log::info!("Frame {frames}: transition complete"),
                SceneEvent::ResetComplete => log::info!("Frame {frames}: reset complete"),
            }
        }

        if *frames % 60 == 0 {
            let state = director.transition_state();
            log::debug!(
                "Frame {frames}: mode {}, progress {:.3}, phase {}",
                director.mode().as_str(),
                state.progress,
                state.current_phase
            );
        }
    }
}
