//! Frame-driven simulation
//!
//! Everything that moves lives here. This module is pure and in-memory:
//! - One `update(delta)` per displayed frame, fixed stage order
//! - Seeded RNG only
//! - Each piece of mutable state has exactly one owner
//! - No rendering or platform dependencies

pub mod clock;
pub mod easing;
pub mod orbit;
pub mod particles;
pub mod phase;
pub mod rig;
pub mod scene;

pub use clock::AnimationClock;
pub use easing::Easing;
pub use orbit::{OrbitingBody, SolarSystem};
pub use particles::{Acceleration, BoundaryPolicy, Breathing, Distribution, Particle, ParticleLayer};
pub use phase::{Phase, PhaseSample, PhaseSchedule, PhaseScheduler, TransitionState};
pub use rig::{CameraRig, CameraTransform, MotionRecipe, OrbitState, OrientationRecipe, RigModeKind, RigUpdate};
pub use scene::{LayerRole, SceneDirector, SceneEvent, ViewMode};
