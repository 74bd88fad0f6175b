/// Light data in the std140 layout the lighting shader reads
///
/// The scene reduces its light components into one `LightsUniformData`
/// per frame. Each kind holds at most `MAX_LIGHTS_PER_KIND` lights; extra
/// lights are dropped with a warning.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

pub const MAX_LIGHTS_PER_KIND: usize = 16;

/// Parameters shared by every light kind (32 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightBase {
    pub color: Vec3,
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub density: f32,
    pub _pad: f32,
}

impl Default for LightBase {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            ambient: 0.2,
            diffuse: 1.0,
            specular: 0.85,
            density: 1.0,
            _pad: 0.0,
        }
    }
}

/// Directional light (48 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightDirect {
    pub base: LightBase,
    /// Points from the scene toward the light
    pub direction: Vec3,
    pub _pad: f32,
}

impl Default for LightDirect {
    fn default() -> Self {
        Self { base: LightBase::default(), direction: Vec3::ONE, _pad: 0.0 }
    }
}

impl LightDirect {
    pub fn new(direction: Vec3) -> Self {
        Self { direction, ..Self::default() }
    }
}

/// Point light with constant/linear/exponential attenuation (64 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightPoint {
    pub base: LightBase,
    pub position: Vec3,
    pub constant: f32,
    pub linear: f32,
    pub exp: f32,
    pub _pad: [f32; 2],
}

impl Default for LightPoint {
    fn default() -> Self {
        Self {
            base: LightBase::default(),
            position: Vec3::ZERO,
            constant: 1.0,
            linear: 0.09,
            exp: 0.032,
            _pad: [0.0; 2],
        }
    }
}

impl LightPoint {
    pub fn at(position: Vec3) -> Self {
        Self { position, ..Self::default() }
    }
}

/// Every light of the frame, uploaded once per frame
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightsUniformData {
    pub direct_count: u32,
    pub point_count: u32,
    pub _pad: [u32; 2],
    pub direct: [LightDirect; MAX_LIGHTS_PER_KIND],
    pub point: [LightPoint; MAX_LIGHTS_PER_KIND],
}

impl Default for LightsUniformData {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl LightsUniformData {
    /// Pack the frame's lights, keeping the first 16 of each kind
    pub fn collect(
        direct: impl IntoIterator<Item = LightDirect>,
        point: impl IntoIterator<Item = LightPoint>,
    ) -> Self {
        let mut data = Self::default();

        let mut dropped_direct = 0usize;
        for light in direct {
            let index = data.direct_count as usize;
            if index < MAX_LIGHTS_PER_KIND {
                data.direct[index] = light;
                data.direct_count += 1;
            } else {
                dropped_direct += 1;
            }
        }

        let mut dropped_point = 0usize;
        for light in point {
            let index = data.point_count as usize;
            if index < MAX_LIGHTS_PER_KIND {
                data.point[index] = light;
                data.point_count += 1;
            } else {
                dropped_point += 1;
            }
        }

        if dropped_direct > 0 || dropped_point > 0 {
            crate::engine_warn!(
                "lumen3d::scene",
                "Light limit {} per kind exceeded: dropped {} directional and {} point lights",
                MAX_LIGHTS_PER_KIND,
                dropped_direct,
                dropped_point
            );
        }
        data
    }

    pub fn directs(&self) -> &[LightDirect] {
        &self.direct[..self.direct_count as usize]
    }

    pub fn points(&self) -> &[LightPoint] {
        &self.point[..self.point_count as usize]
    }

    /// Direction of the light that casts the cascaded shadows
    pub fn shadow_direction(&self) -> Vec3 {
        self.directs().first().map_or(LightDirect::default().direction, |light| light.direction)
    }
}

#[cfg(test)]
#[path = "light_tests.rs"]
mod tests;
