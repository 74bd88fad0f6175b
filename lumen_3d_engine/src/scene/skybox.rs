/// Skybox - cube map drawn first in the lighting pass
///
/// The cube is drawn with depth test LessOrEqual against the geometry
/// pass's depth, which the lighting pass loads, so it only covers pixels
/// no mesh wrote.

use std::sync::Arc;
use glam::Vec3;
use crate::error::{Error, Result};
use crate::graphics_device::{
    Buffer, BufferFormat, BufferUsage, DescriptorSet, DescriptorSetBuilder, SamplerKind, Texture, TextureData,
    TextureDesc, TextureFormat, VertexAttribute, VertexLayout,
};
use crate::renderer::RenderContext;

const fn v(x: f32, y: f32, z: f32) -> Vec3 {
    Vec3::new(x, y, z)
}

/// Unit cube as 36 positions, drawn without face culling
pub const SKYBOX_CUBE: [Vec3; 36] = [
    // -Z
    v(-1.0, 1.0, -1.0), v(-1.0, -1.0, -1.0), v(1.0, -1.0, -1.0),
    v(1.0, -1.0, -1.0), v(1.0, 1.0, -1.0), v(-1.0, 1.0, -1.0),
    // -X
    v(-1.0, -1.0, 1.0), v(-1.0, -1.0, -1.0), v(-1.0, 1.0, -1.0),
    v(-1.0, 1.0, -1.0), v(-1.0, 1.0, 1.0), v(-1.0, -1.0, 1.0),
    // +X
    v(1.0, -1.0, -1.0), v(1.0, -1.0, 1.0), v(1.0, 1.0, 1.0),
    v(1.0, 1.0, 1.0), v(1.0, 1.0, -1.0), v(1.0, -1.0, -1.0),
    // +Z
    v(-1.0, -1.0, 1.0), v(-1.0, 1.0, 1.0), v(1.0, 1.0, 1.0),
    v(1.0, 1.0, 1.0), v(1.0, -1.0, 1.0), v(-1.0, -1.0, 1.0),
    // +Y
    v(-1.0, 1.0, -1.0), v(1.0, 1.0, -1.0), v(1.0, 1.0, 1.0),
    v(1.0, 1.0, 1.0), v(-1.0, 1.0, 1.0), v(-1.0, 1.0, -1.0),
    // -Y
    v(-1.0, -1.0, -1.0), v(-1.0, -1.0, 1.0), v(1.0, -1.0, -1.0),
    v(1.0, -1.0, -1.0), v(-1.0, -1.0, 1.0), v(1.0, -1.0, 1.0),
];

pub struct Skybox {
    texture: Arc<dyn Texture>,
    vertex_buffer: Arc<dyn Buffer>,
    descriptor_set: DescriptorSet,
}

impl Skybox {
    /// Position-only layout of `SKYBOX_CUBE`
    pub fn layout() -> VertexLayout {
        VertexLayout {
            stride: std::mem::size_of::<Vec3>() as u32,
            attributes: vec![VertexAttribute { location: 0, format: BufferFormat::R32G32B32_SFLOAT, offset: 0 }],
        }
    }

    /// Build from six square RGBA8 faces in +X, -X, +Y, -Y, +Z, -Z order
    pub fn from_faces(ctx: &RenderContext, name: &str, size: u32, faces: Vec<Vec<u8>>) -> Result<Self> {
        let desc = TextureDesc::cube(name, size, TextureFormat::R8G8B8A8_SRGB);
        if faces.len() != 6 {
            return Err(Error::InvalidResource(format!("skybox '{}': {} faces, expected 6", name, faces.len())));
        }
        if let Some(face) = faces.iter().position(|f| f.len() != desc.layer_size_bytes()) {
            return Err(Error::InvalidResource(format!(
                "skybox '{}': face {} is not {}x{} RGBA8",
                name, face, size, size
            )));
        }
        let texture = ctx.device().create_texture(&desc, &TextureData::layers(faces))?;
        Self::from_texture(ctx, texture)
    }

    pub fn from_texture(ctx: &RenderContext, texture: Arc<dyn Texture>) -> Result<Self> {
        if !texture.desc().cube {
            return Err(Error::InvalidResource(format!("skybox texture '{}' is not a cube map", texture.desc().name)));
        }
        let vertex_buffer =
            ctx.create_static_buffer("skybox_vertices", BufferUsage::Vertex, bytemuck::cast_slice(&SKYBOX_CUBE))?;
        let descriptor_set = DescriptorSetBuilder::new("skybox", ctx.layouts().skybox.clone())
            .image(0, texture.clone(), ctx.sampler(SamplerKind::LinearClamp))
            .bake(ctx.device())?;
        Ok(Self { texture, vertex_buffer, descriptor_set })
    }

    pub fn texture(&self) -> &Arc<dyn Texture> {
        &self.texture
    }

    pub fn vertex_buffer(&self) -> &dyn Buffer {
        self.vertex_buffer.as_ref()
    }

    pub fn vertex_count(&self) -> u32 {
        SKYBOX_CUBE.len() as u32
    }

    pub fn descriptor_set(&self) -> &DescriptorSet {
        &self.descriptor_set
    }
}

#[cfg(test)]
#[path = "skybox_tests.rs"]
mod tests;
