//! GPU-ready instance types

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::sim::rig::CameraTransform;

/// One particle, laid out for an instanced point/quad draw
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 3],
    pub alpha: f32,
}

impl ParticleInstance {
    pub fn new(position: Vec3, size: f32, color: Vec3, alpha: f32) -> Self {
        Self {
            position: position.to_array(),
            size,
            color: color.to_array(),
            alpha,
        }
    }

    /// Byte view of an instance buffer, ready for upload
    pub fn as_bytes(instances: &[ParticleInstance]) -> &[u8] {
        bytemuck::cast_slice(instances)
    }

    /// Flat float view (8 floats per instance), for hosts that take `Float32Array`s
    pub fn as_floats(instances: &[ParticleInstance]) -> &[f32] {
        bytemuck::cast_slice(instances)
    }
}

/// Camera state packed for a uniform buffer
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct CameraUniform {
    pub position: [f32; 3],
    pub fov_degrees: f32,
    /// Quaternion (x, y, z, w)
    pub orientation: [f32; 4],
    pub exposure: f32,
    pub _pad: [f32; 3],
}

impl From<&CameraTransform> for CameraUniform {
    fn from(camera: &CameraTransform) -> Self {
        Self {
            position: camera.position.to_array(),
            fov_degrees: camera.fov,
            orientation: camera.orientation.to_array(),
            exposure: camera.exposure,
            _pad: [0.0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layouts() {
        assert_eq!(std::mem::size_of::<ParticleInstance>(), 32);
        assert_eq!(std::mem::size_of::<CameraUniform>(), 48);
    }

    #[test]
    fn test_byte_view_length() {
        let instances = vec![ParticleInstance::new(Vec3::ONE, 2.0, Vec3::X, 0.5); 3];
        assert_eq!(ParticleInstance::as_bytes(&instances).len(), 96);
        let floats = ParticleInstance::as_floats(&instances);
        assert_eq!(floats.len(), 24);
        assert_eq!(&floats[..8], &[1.0, 1.0, 1.0, 2.0, 1.0, 0.0, 0.0, 0.5]);
    }

    #[test]
    fn test_camera_uniform_from_transform() {
        let camera = CameraTransform::looking_at_origin(Vec3::new(0.0, 0.0, 10.0), 60.0, 1.2);
        let uniform = CameraUniform::from(&camera);
        assert_eq!(uniform.position, [0.0, 0.0, 10.0]);
        assert_eq!(uniform.fov_degrees, 60.0);
        assert_eq!(uniform.exposure, 1.2);
    }
}
