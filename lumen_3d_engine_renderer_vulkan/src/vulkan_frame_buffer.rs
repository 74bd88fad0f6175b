/// VulkanFramebuffer - Vulkan implementation of the Framebuffer trait
///
/// Holds its attachment textures, so the image views it references live at
/// least as long as the framebuffer.

use lumen_3d_engine::lumen3d::render::{Framebuffer, FramebufferDesc, Texture};
use lumen_3d_engine::lumen3d::Result;
use lumen_3d_engine::engine_err;
use ash::vk;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan::downcast;
use crate::vulkan_context::GpuContext;
use crate::vulkan_render_pass::VulkanRenderPass;
use crate::vulkan_texture::VulkanTexture;

pub struct VulkanFramebuffer {
    ctx: Arc<GpuContext>,
    name: String,
    width: u32,
    height: u32,
    pub(crate) framebuffer: vk::Framebuffer,
    _attachments: Vec<Arc<dyn Texture>>,
}

impl VulkanFramebuffer {
    pub(crate) fn create(ctx: &Arc<GpuContext>, desc: &FramebufferDesc<'_>) -> Result<Self> {
        desc.validate()?;
        let render_pass = downcast::<VulkanRenderPass>(desc.render_pass.as_any(), "render pass")?;

        let views = desc
            .attachments
            .iter()
            .map(|attachment| {
                downcast::<VulkanTexture>(attachment.texture.as_any(), "framebuffer attachment")?
                    .attachment_view(attachment.view)
            })
            .collect::<Result<Vec<_>>>()?;

        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass.render_pass)
            .attachments(&views)
            .width(desc.width)
            .height(desc.height)
            .layers(1);
        let framebuffer = unsafe {
            ctx.device
                .create_framebuffer(&create_info, None)
                .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to create framebuffer '{}': {:?}", desc.name, e))?
        };

        Ok(Self {
            ctx: Arc::clone(ctx),
            name: desc.name.clone(),
            width: desc.width,
            height: desc.height,
            framebuffer,
            _attachments: desc.attachments.iter().map(|a| Arc::clone(&a.texture)).collect(),
        })
    }
}

impl Framebuffer for VulkanFramebuffer {
    fn name(&self) -> &str {
        &self.name
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanFramebuffer {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}
