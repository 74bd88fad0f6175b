/// Uniform buffer and push constant layouts shared with the shaders
///
/// All structs are `#[repr(C)]` and sized to std140 rules so they can be
/// uploaded with `bytemuck::bytes_of`.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec4};
use crate::camera::{Cascade, CameraComponent, TransformComponent};

/// Cascades the shadow uniform block has room for
pub const MAX_CASCADES: usize = 4;

/// Hemisphere samples the SSAO uniform block has room for
pub const MAX_SSAO_KERNEL: usize = 64;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraUniformData {
    pub view: Mat4,
    pub projection: Mat4,
    pub inv_view: Mat4,
    pub inv_projection: Mat4,
    /// World-space eye position (w = 1)
    pub position: Vec4,
    /// Viewport width, height, near, far
    pub viewport: Vec4,
}

impl CameraUniformData {
    pub fn from_camera(camera: &CameraComponent, extent: (u32, u32)) -> Self {
        Self {
            view: camera.view(),
            projection: camera.projection(),
            inv_view: camera.inverse_view(),
            inv_projection: camera.inverse_projection(),
            position: camera.position().extend(1.0),
            viewport: Vec4::new(extent.0 as f32, extent.1 as f32, camera.near(), camera.far()),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ShadowUniformData {
    pub cascade_view_projection: [Mat4; MAX_CASCADES],
    /// Split depth of cascade N in component N
    pub split_depths: Vec4,
    pub cascade_count: u32,
    pub _pad: [u32; 3],
}

impl Default for ShadowUniformData {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl ShadowUniformData {
    /// Pack up to `MAX_CASCADES` cascades
    pub fn from_cascades(cascades: &[Cascade]) -> Self {
        let mut data = Self::default();
        let mut splits = [0.0f32; MAX_CASCADES];
        for (i, cascade) in cascades.iter().take(MAX_CASCADES).enumerate() {
            data.cascade_view_projection[i] = cascade.view_projection;
            splits[i] = cascade.split_depth;
        }
        data.split_depths = Vec4::from_array(splits);
        data.cascade_count = cascades.len().min(MAX_CASCADES) as u32;
        data
    }
}

/// Per-mesh matrices, rewritten before every draw of the mesh
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshUniformData {
    pub model: Mat4,
    pub normal: Mat4,
}

impl Default for MeshUniformData {
    fn default() -> Self {
        Self { model: Mat4::IDENTITY, normal: Mat4::IDENTITY }
    }
}

impl MeshUniformData {
    pub fn from_transform(transform: &TransformComponent) -> Self {
        Self { model: transform.world_matrix(), normal: transform.normal_matrix() }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SsaoUniformData {
    pub samples: [Vec4; MAX_SSAO_KERNEL],
    pub radius: f32,
    pub bias: f32,
    pub kernel_size: u32,
    pub _pad: u32,
    /// Viewport size divided by the noise texture size
    pub noise_scale: Vec2,
    pub _pad2: Vec2,
}

impl SsaoUniformData {
    pub fn new(kernel: &[Vec4], radius: f32, bias: f32, noise_scale: Vec2) -> Self {
        let mut samples = [Vec4::ZERO; MAX_SSAO_KERNEL];
        let count = kernel.len().min(MAX_SSAO_KERNEL);
        samples[..count].copy_from_slice(&kernel[..count]);
        Self {
            samples,
            radius,
            bias,
            kernel_size: count as u32,
            _pad: 0,
            noise_scale,
            _pad2: Vec2::ZERO,
        }
    }
}

// ============================================================================
// Push constants
// ============================================================================

/// Shadow pass: which cascade matrix the vertex shader uses
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct CascadeIndex {
    pub index: u32,
}

/// Lighting pass debug switches
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct LightingFlags {
    pub ssao_enabled: u32,
    pub ssao_only: u32,
}

impl LightingFlags {
    pub fn new(ssao_enabled: bool, ssao_only: bool) -> Self {
        Self { ssao_enabled: ssao_enabled as u32, ssao_only: ssao_only as u32 }
    }
}

/// SSAO blur axis
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BlurDirection {
    pub direction: Vec2,
}

impl BlurDirection {
    pub const HORIZONTAL: BlurDirection = BlurDirection { direction: Vec2::X };
    pub const VERTICAL: BlurDirection = BlurDirection { direction: Vec2::Y };
}

#[cfg(test)]
#[path = "uniforms_tests.rs"]
mod tests;
