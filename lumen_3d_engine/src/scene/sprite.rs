/// Sprite component - a textured, tinted quad drawn in the sprite pass
///
/// Every sprite shares the renderer's unit quad (`SPRITE_QUAD`) and owns a
/// uniform buffer plus a descriptor set binding its texture.

use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3, Vec4};
use crate::error::{Error, Result};
use crate::camera::TransformComponent;
use crate::graphics_device::{
    write_uniform, Buffer, BufferFormat, DescriptorSet, DescriptorSetBuilder, SamplerKind, Texture, VertexAttribute,
    VertexLayout,
};
use crate::renderer::RenderContext;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SpriteVertex {
    pub position: Vec3,
    pub uv: Vec2,
}

impl SpriteVertex {
    pub const fn new(x: f32, y: f32, u: f32, v: f32) -> Self {
        Self { position: Vec3::new(x, y, 0.0), uv: Vec2::new(u, v) }
    }

    pub fn layout() -> VertexLayout {
        VertexLayout {
            stride: std::mem::size_of::<SpriteVertex>() as u32,
            attributes: vec![
                VertexAttribute { location: 0, format: BufferFormat::R32G32B32_SFLOAT, offset: 0 },
                VertexAttribute { location: 1, format: BufferFormat::R32G32_SFLOAT, offset: 12 },
            ],
        }
    }
}

/// Unit quad centered on the origin, two counter-clockwise triangles
pub const SPRITE_QUAD: [SpriteVertex; 6] = [
    SpriteVertex::new(-0.5, -0.5, 0.0, 1.0),
    SpriteVertex::new(0.5, -0.5, 1.0, 1.0),
    SpriteVertex::new(0.5, 0.5, 1.0, 0.0),
    SpriteVertex::new(-0.5, -0.5, 0.0, 1.0),
    SpriteVertex::new(0.5, 0.5, 1.0, 0.0),
    SpriteVertex::new(-0.5, 0.5, 0.0, 0.0),
];

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SpriteUniformData {
    pub model: Mat4,
    pub color: Vec4,
}

struct SpriteGpu {
    uniform_buffer: Arc<dyn Buffer>,
    descriptor_set: DescriptorSet,
}

pub struct SpriteComponent {
    pub texture: Arc<dyn Texture>,
    /// Multiplied with the texture color
    pub color: Vec4,
    /// World-space quad size
    pub size: Vec2,
    pub enabled: bool,
    gpu: Option<SpriteGpu>,
}

impl SpriteComponent {
    pub fn new(texture: Arc<dyn Texture>) -> Self {
        Self { texture, color: Vec4::ONE, size: Vec2::ONE, enabled: true, gpu: None }
    }

    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    pub fn with_size(mut self, size: Vec2) -> Self {
        self.size = size;
        self
    }

    pub fn is_allocated(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn allocate(&mut self, ctx: &RenderContext) -> Result<()> {
        let name = &self.texture.desc().name;
        let uniform_buffer = ctx.create_uniform_buffer(&format!("sprite_{}_uniform", name), &self.uniform_data(
            &TransformComponent::default(),
        ))?;
        let descriptor_set = DescriptorSetBuilder::new(format!("sprite_{}", name), ctx.layouts().sprite.clone())
            .uniform(0, uniform_buffer.clone())
            .image(1, self.texture.clone(), ctx.sampler(SamplerKind::Linear))
            .bake(ctx.device())?;
        self.gpu = Some(SpriteGpu { uniform_buffer, descriptor_set });
        Ok(())
    }

    pub fn deallocate(&mut self) {
        self.gpu = None;
    }

    /// Swap the texture; rebinds the descriptor set when allocated
    pub fn set_texture(&mut self, ctx: &RenderContext, texture: Arc<dyn Texture>) -> Result<()> {
        self.texture = texture;
        if self.gpu.is_some() {
            self.allocate(ctx)?;
        }
        Ok(())
    }

    pub fn uniform_data(&self, transform: &TransformComponent) -> SpriteUniformData {
        SpriteUniformData {
            model: transform.world_matrix() * Mat4::from_scale(self.size.extend(1.0)),
            color: self.color,
        }
    }

    pub fn update(&self, transform: &TransformComponent) -> Result<()> {
        let gpu = self.require_gpu()?;
        write_uniform(gpu.uniform_buffer.as_ref(), &self.uniform_data(transform))
    }

    pub fn descriptor_set(&self) -> Option<&DescriptorSet> {
        self.gpu.as_ref().map(|gpu| &gpu.descriptor_set)
    }

    fn require_gpu(&self) -> Result<&SpriteGpu> {
        self.gpu
            .as_ref()
            .ok_or_else(|| Error::InvalidResource(format!("sprite '{}' is not allocated", self.texture.desc().name)))
    }
}

#[cfg(test)]
#[path = "sprite_tests.rs"]
mod tests;
