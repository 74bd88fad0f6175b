/// CommandList trait - for recording rendering commands

use std::any::Any;
use crate::error::Result;
use super::buffer::Buffer;
use super::descriptor::GpuDescriptorSet;
use super::frame_buffer::Framebuffer;
use super::layout::{ImageLayout, TransitionRule};
use super::pipeline::{GpuPipeline, IndexType};
use super::render_pass::GpuRenderPass;
use super::shader::ShaderStageFlags;
use super::texture::Texture;

/// Command list for recording rendering commands
///
/// Commands are recorded between `begin` and `end`, then handed to
/// `GraphicsDevice::submit_frame`.
pub trait CommandList: Send + Sync {
    /// Begin recording commands (resets previous content)
    fn begin(&mut self) -> Result<()>;

    /// End recording commands
    fn end(&mut self) -> Result<()>;

    /// Begin a render pass
    ///
    /// # Arguments
    ///
    /// * `render_pass` - The render pass to begin
    /// * `framebuffer` - Framebuffer built against that render pass
    /// * `clear_values` - One clear value per attachment slot
    fn begin_render_pass(
        &mut self,
        render_pass: &dyn GpuRenderPass,
        framebuffer: &dyn Framebuffer,
        clear_values: &[ClearValue],
    ) -> Result<()>;

    /// End the current render pass
    fn end_render_pass(&mut self) -> Result<()>;

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()>;

    /// Bind a graphics pipeline
    fn bind_pipeline(&mut self, pipeline: &dyn GpuPipeline) -> Result<()>;

    /// Bind descriptor sets starting at `first_set`
    ///
    /// # Arguments
    ///
    /// * `pipeline` - Pipeline whose layout the sets are bound against
    /// * `first_set` - Set index of `sets[0]`
    /// * `sets` - Consecutive descriptor sets
    fn bind_descriptor_sets(
        &mut self,
        pipeline: &dyn GpuPipeline,
        first_set: u32,
        sets: &[&dyn GpuDescriptorSet],
    ) -> Result<()>;

    /// Push constants to the pipeline
    ///
    /// # Arguments
    ///
    /// * `pipeline` - Pipeline whose layout declares the range
    /// * `stages` - Shader stages that will access the push constants
    /// * `offset` - Offset in bytes into push constant range
    /// * `data` - Data to push
    fn push_constants(
        &mut self,
        pipeline: &dyn GpuPipeline,
        stages: ShaderStageFlags,
        offset: u32,
        data: &[u8],
    ) -> Result<()>;

    /// Bind a vertex buffer at binding 0
    fn bind_vertex_buffer(&mut self, buffer: &dyn Buffer, offset: u64) -> Result<()>;

    /// Bind an index buffer
    fn bind_index_buffer(&mut self, buffer: &dyn Buffer, offset: u64, index_type: IndexType) -> Result<()>;

    /// Draw vertices
    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()>;

    /// Draw indexed vertices
    ///
    /// # Arguments
    ///
    /// * `index_count` - Number of indices to draw
    /// * `first_index` - Index of first index
    /// * `vertex_offset` - Value added to vertex index before indexing into the vertex buffer
    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()>;

    /// Record image layout barriers (outside a render pass)
    fn pipeline_barrier(&mut self, barriers: &[ImageBarrier<'_>]) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
}

/// One image layout change recorded by `CommandList::pipeline_barrier`
pub struct ImageBarrier<'a> {
    pub texture: &'a dyn Texture,
    pub old_layout: ImageLayout,
    pub new_layout: ImageLayout,
    pub rule: TransitionRule,
    pub base_layer: u32,
    pub layer_count: u32,
}

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-target viewport with depth 0..1
    pub fn full(width: u32, height: u32) -> Self {
        Self { x: 0.0, y: 0.0, width: width as f32, height: height as f32, min_depth: 0.0, max_depth: 1.0 }
    }
}

/// 2D rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect2D {
    pub fn full(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }
}

/// Clear value for an attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    /// Color clear value (RGBA)
    Color([f32; 4]),
    /// Depth/stencil clear value
    DepthStencil { depth: f32, stencil: u32 },
}
