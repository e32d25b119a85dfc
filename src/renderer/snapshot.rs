//! Per-frame snapshot of everything the backend draws

use glam::Vec3;

use super::instance::{CameraUniform, ParticleInstance};
use crate::sim::scene::ViewMode;

/// One armed particle layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerView {
    pub name: String,
    pub opacity: f32,
    pub size_scale: f32,
    pub instances: Vec<ParticleInstance>,
}

/// One orbiting subject
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyView {
    pub position: Vec3,
    pub spin: f32,
    pub size: f32,
}

/// Committed frame state. Built after `update`, never mid-frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub mode: ViewMode,
    pub camera: CameraUniform,
    /// Drives the procedural background shader
    pub background_time: f32,
    /// Transition progress, 0 outside a transition
    pub progress: f32,
    pub layers: Vec<LayerView>,
    /// Empty while the primary view is hidden
    pub bodies: Vec<BodyView>,
}

impl FrameSnapshot {
    pub fn particle_count(&self) -> usize {
        self.layers.iter().map(|l| l.instances.len()).sum()
    }

    pub fn layer(&self, name: &str) -> Option<&LayerView> {
        self.layers.iter().find(|l| l.name == name)
    }
}
