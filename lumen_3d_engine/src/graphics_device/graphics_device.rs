/// GraphicsDevice trait - the narrow GPU context every resource is created through
///
/// The device is passed explicitly (`&dyn GraphicsDevice` or
/// `Arc<dyn GraphicsDevice>`) to everything that allocates GPU objects;
/// there is no global renderer.

use std::sync::Arc;
use crate::error::Result;
use super::attachment::{AttachmentTexture, AttachmentTextureDesc};
use super::buffer::{Buffer, BufferDesc};
use super::command_list::CommandList;
use super::descriptor::{DescriptorSetLayout, DescriptorSetLayoutDesc, DescriptorWrite, GpuDescriptorSet};
use super::frame_buffer::{Framebuffer, FramebufferDesc};
use super::pipeline::{GpuPipeline, PipelineCreateInfo};
use super::render_pass::{GpuRenderPass, RenderPassDesc};
use super::sampler::{Sampler, SamplerKind};
use super::shader::{Shader, ShaderDesc};
use super::swapchain::Swapchain;
use super::texture::{SampleCount, Texture, TextureData, TextureDesc, TextureFormat};

/// Main device trait
///
/// Implemented by backend-specific devices (e.g., VulkanGraphicsDevice).
pub trait GraphicsDevice: Send + Sync {
    /// Create a buffer
    ///
    /// # Arguments
    ///
    /// * `desc` - Buffer descriptor
    /// * `data` - Initial content; required for vertex and index buffers
    fn create_buffer(&self, desc: &BufferDesc, data: Option<&[u8]>) -> Result<Arc<dyn Buffer>>;

    /// Create a sampled texture, upload `data` and generate its mip chain
    ///
    /// Fails with `Unsupported` when mips are requested and the format
    /// cannot be linearly blitted.
    fn create_texture(&self, desc: &TextureDesc, data: &TextureData) -> Result<Arc<dyn Texture>>;

    /// Create a render-target image already transitioned to its kind's
    /// attachment layout
    fn create_attachment_texture(&self, desc: &AttachmentTextureDesc) -> Result<Arc<AttachmentTexture>>;

    fn create_sampler(&self, kind: SamplerKind) -> Result<Arc<dyn Sampler>>;

    fn create_shader(&self, desc: &ShaderDesc<'_>) -> Result<Arc<dyn Shader>>;

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn GpuRenderPass>>;

    fn create_framebuffer(&self, desc: &FramebufferDesc<'_>) -> Result<Arc<dyn Framebuffer>>;

    fn create_descriptor_set_layout(&self, desc: &DescriptorSetLayoutDesc) -> Result<Arc<dyn DescriptorSetLayout>>;

    /// Allocate a descriptor set from a pool of its own and write `writes`
    fn create_descriptor_set(
        &self,
        layout: &dyn DescriptorSetLayout,
        writes: &[DescriptorWrite],
    ) -> Result<Box<dyn GpuDescriptorSet>>;

    fn create_pipeline(&self, info: &PipelineCreateInfo<'_>) -> Result<Box<dyn GpuPipeline>>;

    fn create_command_list(&self) -> Result<Box<dyn CommandList>>;

    /// Block until the frame fence is signaled (no timeout)
    fn wait_for_frame_fence(&self) -> Result<()>;

    /// Reset the frame fence and submit `cmd`, waiting on the swapchain's
    /// image-available semaphore and signaling render-finished + fence
    fn submit_frame(&self, cmd: &dyn CommandList, swapchain: &dyn Swapchain) -> Result<()>;

    /// Highest sample count usable for both color and depth attachments
    fn max_usable_sample_count(&self) -> SampleCount;

    fn supports_linear_blit(&self, format: TextureFormat) -> bool;

    /// Wait for the device to be idle
    fn wait_idle(&self) -> Result<()>;

    fn device_name(&self) -> &str;
}
