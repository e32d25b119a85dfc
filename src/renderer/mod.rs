//! Render-facing data
//!
//! The backend reads these after `SceneDirector::update` returns. Nothing here
//! feeds back into the simulation.

pub mod instance;
pub mod snapshot;

pub use instance::{CameraUniform, ParticleInstance};
pub use snapshot::{BodyView, FrameSnapshot, LayerView};
