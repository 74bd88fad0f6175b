/// VulkanCommandList - Vulkan implementation of the CommandList trait
///
/// Owns a command pool with one primary command buffer that is reset by
/// every `begin`. Recording state is tracked so misuse (drawing outside a
/// render pass, ending inside one) surfaces as `InvalidState` instead of a
/// driver crash.

use lumen_3d_engine::lumen3d::render::{
    Buffer, ClearValue, CommandList, Framebuffer, GpuDescriptorSet, GpuPipeline, GpuRenderPass, ImageBarrier,
    IndexType, Rect2D, ShaderStageFlags, Viewport,
};
use lumen_3d_engine::lumen3d::{Error, Result};
use lumen_3d_engine::engine_err;
use ash::vk;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan::{downcast, index_type_to_vk, stage_flags_to_vk};
use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_descriptor_set::VulkanDescriptorSet;
use crate::vulkan_frame_buffer::VulkanFramebuffer;
use crate::vulkan_pipeline::VulkanPipeline;
use crate::vulkan_render_pass::VulkanRenderPass;
use crate::vulkan_texture::VulkanTexture;

pub struct VulkanCommandList {
    ctx: Arc<GpuContext>,
    command_pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
    is_recording: bool,
    in_render_pass: bool,
}

pub(crate) fn clear_value_to_vk(value: ClearValue) -> vk::ClearValue {
    match value {
        ClearValue::Color(float32) => vk::ClearValue { color: vk::ClearColorValue { float32 } },
        ClearValue::DepthStencil { depth, stencil } => vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue { depth, stencil },
        },
    }
}

impl VulkanCommandList {
    pub(crate) fn new(ctx: &Arc<GpuContext>) -> Result<Self> {
        unsafe {
            let pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(ctx.graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
            let command_pool = ctx
                .device
                .create_command_pool(&pool_info, None)
                .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to create command pool: {:?}", e))?;

            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let command_buffer = match ctx.device.allocate_command_buffers(&allocate_info) {
                Ok(buffers) => buffers[0],
                Err(e) => {
                    ctx.device.destroy_command_pool(command_pool, None);
                    return Err(engine_err!("lumen3d::vulkan", "Failed to allocate command buffer: {:?}", e));
                }
            };

            Ok(Self {
                ctx: Arc::clone(ctx),
                command_pool,
                command_buffer,
                is_recording: false,
                in_render_pass: false,
            })
        }
    }

    pub(crate) fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }

    fn require_recording(&self, op: &str) -> Result<()> {
        if !self.is_recording {
            return Err(Error::InvalidState(format!("{}: command list is not recording", op)));
        }
        Ok(())
    }

    fn require_render_pass(&self, op: &str) -> Result<()> {
        self.require_recording(op)?;
        if !self.in_render_pass {
            return Err(Error::InvalidState(format!("{}: no render pass is active", op)));
        }
        Ok(())
    }
}

impl CommandList for VulkanCommandList {
    fn begin(&mut self) -> Result<()> {
        if self.is_recording {
            return Err(Error::InvalidState("begin: command list already recording".to_string()));
        }
        unsafe {
            self.ctx
                .device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to reset command buffer: {:?}", e))?;
            let begin_info = vk::CommandBufferBeginInfo::default().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            self.ctx
                .device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to begin command buffer: {:?}", e))?;
        }
        self.is_recording = true;
        self.in_render_pass = false;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.require_recording("end")?;
        if self.in_render_pass {
            return Err(Error::InvalidState("end: render pass still active".to_string()));
        }
        unsafe {
            self.ctx
                .device
                .end_command_buffer(self.command_buffer)
                .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to end command buffer: {:?}", e))?;
        }
        self.is_recording = false;
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &dyn GpuRenderPass,
        framebuffer: &dyn Framebuffer,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.require_recording("begin_render_pass")?;
        if self.in_render_pass {
            return Err(Error::InvalidState("begin_render_pass: a render pass is already active".to_string()));
        }
        let vk_pass = downcast::<VulkanRenderPass>(render_pass.as_any(), "render pass")?;
        let vk_framebuffer = downcast::<VulkanFramebuffer>(framebuffer.as_any(), "framebuffer")?;
        if clear_values.len() != vk_pass.attachment_count() {
            return Err(Error::InvalidResource(format!(
                "render pass '{}' has {} attachments, got {} clear values",
                vk_pass.name(),
                vk_pass.attachment_count(),
                clear_values.len()
            )));
        }

        let clears: Vec<vk::ClearValue> = clear_values.iter().copied().map(clear_value_to_vk).collect();
        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(vk_pass.render_pass)
            .framebuffer(vk_framebuffer.framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D { width: framebuffer.width(), height: framebuffer.height() },
            })
            .clear_values(&clears);
        unsafe {
            self.ctx
                .device
                .cmd_begin_render_pass(self.command_buffer, &begin_info, vk::SubpassContents::INLINE);
        }
        self.in_render_pass = true;
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.require_render_pass("end_render_pass")?;
        unsafe {
            self.ctx.device.cmd_end_render_pass(self.command_buffer);
        }
        self.in_render_pass = false;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.require_recording("set_viewport")?;
        let vk_viewport = vk::Viewport {
            x: viewport.x,
            y: viewport.y,
            width: viewport.width,
            height: viewport.height,
            min_depth: viewport.min_depth,
            max_depth: viewport.max_depth,
        };
        unsafe {
            self.ctx.device.cmd_set_viewport(self.command_buffer, 0, &[vk_viewport]);
        }
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.require_recording("set_scissor")?;
        let vk_scissor = vk::Rect2D {
            offset: vk::Offset2D { x: scissor.x, y: scissor.y },
            extent: vk::Extent2D { width: scissor.width, height: scissor.height },
        };
        unsafe {
            self.ctx.device.cmd_set_scissor(self.command_buffer, 0, &[vk_scissor]);
        }
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &dyn GpuPipeline) -> Result<()> {
        self.require_render_pass("bind_pipeline")?;
        let vk_pipeline = downcast::<VulkanPipeline>(pipeline.as_any(), "pipeline")?;
        unsafe {
            self.ctx
                .device
                .cmd_bind_pipeline(self.command_buffer, vk::PipelineBindPoint::GRAPHICS, vk_pipeline.pipeline);
        }
        Ok(())
    }

    fn bind_descriptor_sets(
        &mut self,
        pipeline: &dyn GpuPipeline,
        first_set: u32,
        sets: &[&dyn GpuDescriptorSet],
    ) -> Result<()> {
        self.require_recording("bind_descriptor_sets")?;
        let vk_pipeline = downcast::<VulkanPipeline>(pipeline.as_any(), "pipeline")?;
        let end = first_set as usize + sets.len();
        if end > vk_pipeline.set_count() {
            return Err(Error::InvalidResource(format!(
                "pipeline '{}' has {} set layouts, cannot bind sets {}..{}",
                vk_pipeline.name(),
                vk_pipeline.set_count(),
                first_set,
                end
            )));
        }
        let handles = sets
            .iter()
            .map(|set| downcast::<VulkanDescriptorSet>(set.as_any(), "descriptor set").map(|s| s.set))
            .collect::<Result<Vec<_>>>()?;
        unsafe {
            self.ctx.device.cmd_bind_descriptor_sets(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_pipeline.layout,
                first_set,
                &handles,
                &[],
            );
        }
        Ok(())
    }

    fn push_constants(&mut self, pipeline: &dyn GpuPipeline, stages: ShaderStageFlags, offset: u32, data: &[u8]) -> Result<()> {
        self.require_recording("push_constants")?;
        let vk_pipeline = downcast::<VulkanPipeline>(pipeline.as_any(), "pipeline")?;
        vk_pipeline.check_push_range(stages, offset, data.len() as u32)?;
        unsafe {
            self.ctx.device.cmd_push_constants(
                self.command_buffer,
                vk_pipeline.layout,
                stage_flags_to_vk(stages),
                offset,
                data,
            );
        }
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &dyn Buffer, offset: u64) -> Result<()> {
        self.require_recording("bind_vertex_buffer")?;
        let vk_buffer = downcast::<VulkanBuffer>(buffer.as_any(), "vertex buffer")?;
        unsafe {
            self.ctx
                .device
                .cmd_bind_vertex_buffers(self.command_buffer, 0, &[vk_buffer.buffer], &[offset]);
        }
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: &dyn Buffer, offset: u64, index_type: IndexType) -> Result<()> {
        self.require_recording("bind_index_buffer")?;
        let vk_buffer = downcast::<VulkanBuffer>(buffer.as_any(), "index buffer")?;
        unsafe {
            self.ctx
                .device
                .cmd_bind_index_buffer(self.command_buffer, vk_buffer.buffer, offset, index_type_to_vk(index_type));
        }
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.require_render_pass("draw")?;
        unsafe {
            self.ctx.device.cmd_draw(self.command_buffer, vertex_count, 1, first_vertex, 0);
        }
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.require_render_pass("draw_indexed")?;
        unsafe {
            self.ctx
                .device
                .cmd_draw_indexed(self.command_buffer, index_count, 1, first_index, vertex_offset, 0);
        }
        Ok(())
    }

    fn pipeline_barrier(&mut self, barriers: &[ImageBarrier<'_>]) -> Result<()> {
        self.require_recording("pipeline_barrier")?;
        if self.in_render_pass {
            return Err(Error::InvalidState("pipeline_barrier: not allowed inside a render pass".to_string()));
        }
        for barrier in barriers {
            let texture = downcast::<VulkanTexture>(barrier.texture.as_any(), "texture")?;
            texture.record_barrier(
                &self.ctx.device,
                self.command_buffer,
                barrier.old_layout,
                barrier.new_layout,
                barrier.rule,
                barrier.base_layer,
                barrier.layer_count,
            );
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanCommandList {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.device_wait_idle().ok();
            self.ctx.device.destroy_command_pool(self.command_pool, None);
        }
    }
}
