/// Mesh - vertex/index data plus the GPU resources allocated from it
///
/// The loader fills `vertices`, `indices` and `material`. `allocate`
/// uploads them once into device-local buffers and builds the mesh's
/// uniform buffer and descriptor set; `deallocate` (or drop) releases them.

use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use crate::error::{Error, Result};
use crate::camera::TransformComponent;
use crate::graphics_device::{
    write_uniform, Buffer, BufferFormat, BufferUsage, DescriptorSet, DescriptorSetBuilder, SamplerKind,
    VertexAttribute, VertexLayout,
};
use crate::renderer::{MeshUniformData, RenderContext};
use super::bounds::AABB;
use super::material::{Material, MaterialSlot};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
    pub tangent: Vec3,
    pub bitangent: Vec3,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self { position, normal, uv, ..Self::default() }
    }

    /// Interleaved layout at binding 0, locations 0..=4
    pub fn layout() -> VertexLayout {
        let attribute = |location: u32, format: BufferFormat, offset: usize| VertexAttribute {
            location,
            format,
            offset: offset as u32,
        };
        VertexLayout {
            stride: std::mem::size_of::<Vertex>() as u32,
            attributes: vec![
                attribute(0, BufferFormat::R32G32B32_SFLOAT, std::mem::offset_of!(Vertex, position)),
                attribute(1, BufferFormat::R32G32B32_SFLOAT, std::mem::offset_of!(Vertex, normal)),
                attribute(2, BufferFormat::R32G32_SFLOAT, std::mem::offset_of!(Vertex, uv)),
                attribute(3, BufferFormat::R32G32B32_SFLOAT, std::mem::offset_of!(Vertex, tangent)),
                attribute(4, BufferFormat::R32G32B32_SFLOAT, std::mem::offset_of!(Vertex, bitangent)),
            ],
        }
    }
}

/// GPU side of an allocated mesh
pub struct MeshGpu {
    pub vertex_buffer: Arc<dyn Buffer>,
    pub index_buffer: Arc<dyn Buffer>,
    pub uniform_buffer: Arc<dyn Buffer>,
    pub descriptor_set: DescriptorSet,
}

pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub material: Material,
    /// Local-space bounds, used for frustum culling
    pub bounds: AABB,
    pub casts_shadows: bool,
    gpu: Option<MeshGpu>,
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("name", &self.name)
            .field("vertices", &self.vertices.len())
            .field("indices", &self.indices.len())
            .field("allocated", &self.gpu.is_some())
            .finish()
    }
}

impl Mesh {
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u32>, material: Material) -> Self {
        let bounds = AABB::from_points(vertices.iter().map(|v| v.position));
        Self {
            name: name.into(),
            vertices,
            indices,
            material,
            bounds,
            casts_shadows: true,
            gpu: None,
        }
    }

    pub fn is_allocated(&self) -> bool {
        self.gpu.is_some()
    }

    pub fn gpu(&self) -> Option<&MeshGpu> {
        self.gpu.as_ref()
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Upload buffers and build the descriptor set. Replaces any previous
    /// allocation.
    pub fn allocate(&mut self, ctx: &RenderContext) -> Result<()> {
        if self.vertices.is_empty() || self.indices.is_empty() {
            return Err(Error::InvalidResource(format!("mesh '{}' has no geometry", self.name)));
        }
        let vertex_count = self.vertices.len() as u32;
        if let Some(bad) = self.indices.iter().find(|&&i| i >= vertex_count) {
            return Err(Error::InvalidResource(format!(
                "mesh '{}': index {} out of range for {} vertices",
                self.name, bad, vertex_count
            )));
        }

        let vertex_buffer = ctx.create_static_buffer(
            &format!("{}_vertices", self.name),
            BufferUsage::Vertex,
            bytemuck::cast_slice(&self.vertices),
        )?;
        let index_buffer = ctx.create_static_buffer(
            &format!("{}_indices", self.name),
            BufferUsage::Index,
            bytemuck::cast_slice(&self.indices),
        )?;
        let uniform_buffer = ctx.create_uniform_buffer(&format!("{}_uniform", self.name), &MeshUniformData::default())?;

        let sampler = ctx.sampler(SamplerKind::Linear);
        let mut builder = DescriptorSetBuilder::new(format!("{}_set", self.name), ctx.layouts().mesh.clone())
            .uniform(0, uniform_buffer.clone());
        for slot in MaterialSlot::ALL {
            let texture = self.material.texture_or(slot, ctx.blank_texture()).clone();
            builder = builder.image(slot.binding(), texture, sampler.clone());
        }
        let descriptor_set = builder.bake(ctx.device())?;

        self.gpu = Some(MeshGpu { vertex_buffer, index_buffer, uniform_buffer, descriptor_set });
        crate::engine_trace!("lumen3d::scene", "Allocated mesh '{}' ({} indices)", self.name, self.indices.len());
        Ok(())
    }

    pub fn deallocate(&mut self) {
        self.gpu = None;
    }

    /// Write this frame's matrices into the uniform buffer
    pub fn update_uniforms(&self, transform: &TransformComponent) -> Result<()> {
        let gpu = self
            .gpu
            .as_ref()
            .ok_or_else(|| Error::InvalidResource(format!("mesh '{}' is not allocated", self.name)))?;
        write_uniform(gpu.uniform_buffer.as_ref(), &MeshUniformData::from_transform(transform))
    }
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
