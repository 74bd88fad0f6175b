/*!
# Lumen 3D Engine - Vulkan Backend

Vulkan implementation of the `GraphicsDevice` family of traits from
`lumen_3d_engine`, built on Ash for the bindings and gpu-allocator for
memory management.

Every object created here keeps the shared device context alive, so drop
order between textures, framebuffers, pipelines and the device itself does
not matter.

```no_run
use lumen_3d_engine::lumen3d::render::Config;
use lumen_3d_engine_renderer_vulkan::VulkanGraphicsDevice;
# fn demo(window: &winit::window::Window) -> lumen_3d_engine::lumen3d::Result<()> {
let device = VulkanGraphicsDevice::new(window, &Config::default())?;
let size = window.inner_size();
let swapchain = device.create_swapchain(window, size.width, size.height, true)?;
# Ok(())
# }
```
*/

mod vulkan;
mod vulkan_context;
mod vulkan_buffer;
mod vulkan_texture;
mod vulkan_sampler;
mod vulkan_shader;
mod vulkan_descriptor_set;
mod vulkan_render_pass;
mod vulkan_frame_buffer;
mod vulkan_pipeline;
mod vulkan_command_list;
mod vulkan_swapchain;

#[cfg(feature = "vulkan-validation")]
mod debug;

pub use vulkan::VulkanGraphicsDevice;
pub use vulkan_buffer::VulkanBuffer;
pub use vulkan_command_list::VulkanCommandList;
pub use vulkan_descriptor_set::{VulkanDescriptorSet, VulkanDescriptorSetLayout};
pub use vulkan_frame_buffer::VulkanFramebuffer;
pub use vulkan_pipeline::VulkanPipeline;
pub use vulkan_render_pass::VulkanRenderPass;
pub use vulkan_sampler::VulkanSampler;
pub use vulkan_shader::VulkanShader;
pub use vulkan_swapchain::VulkanSwapchain;
pub use vulkan_texture::VulkanTexture;

// Validation layer statistics (only with the vulkan-validation feature)
#[cfg(feature = "vulkan-validation")]
pub use debug::{get_validation_stats, print_validation_stats_report, DebugConfig};
