/// VulkanRenderPass - single-subpass render pass built from a RenderPassDesc

use lumen_3d_engine::lumen3d::render::{GpuRenderPass, RenderPassDesc, SubpassRef};
use lumen_3d_engine::lumen3d::Result;
use lumen_3d_engine::{engine_debug, engine_err};
use ash::vk;
use std::any::Any;
use std::sync::Arc;

use crate::vulkan::{
    access_flags_to_vk, format_to_vk, image_layout_to_vk, load_op_to_vk, pipeline_stages_to_vk, sample_count_to_vk,
    store_op_to_vk,
};
use crate::vulkan_context::GpuContext;

pub struct VulkanRenderPass {
    ctx: Arc<GpuContext>,
    name: String,
    attachment_count: usize,
    pub(crate) render_pass: vk::RenderPass,
}

fn subpass_to_vk(subpass: SubpassRef) -> u32 {
    match subpass {
        SubpassRef::External => vk::SUBPASS_EXTERNAL,
        SubpassRef::Index(index) => index,
    }
}

impl VulkanRenderPass {
    pub(crate) fn create(ctx: &Arc<GpuContext>, desc: &RenderPassDesc) -> Result<Self> {
        let attachments: Vec<vk::AttachmentDescription> = desc
            .attachments
            .iter()
            .map(|a| {
                vk::AttachmentDescription::default()
                    .format(format_to_vk(a.format))
                    .samples(sample_count_to_vk(a.samples))
                    .load_op(load_op_to_vk(a.load_op))
                    .store_op(store_op_to_vk(a.store_op))
                    .stencil_load_op(load_op_to_vk(a.stencil_load_op))
                    .stencil_store_op(store_op_to_vk(a.stencil_store_op))
                    .initial_layout(image_layout_to_vk(a.initial_layout))
                    .final_layout(image_layout_to_vk(a.final_layout))
            })
            .collect();

        let color_refs: Vec<vk::AttachmentReference> = desc
            .color_indices()
            .into_iter()
            .map(|index| {
                vk::AttachmentReference::default()
                    .attachment(index)
                    .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            })
            .collect();
        let resolve_refs: Vec<vk::AttachmentReference> = desc
            .resolve_indices()
            .into_iter()
            .map(|index| {
                vk::AttachmentReference::default()
                    .attachment(index)
                    .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            })
            .collect();
        let depth_ref = desc.depth_index().map(|index| {
            vk::AttachmentReference::default()
                .attachment(index)
                .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
        });

        let mut subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs);
        if !resolve_refs.is_empty() {
            subpass = subpass.resolve_attachments(&resolve_refs);
        }
        if let Some(depth_ref) = depth_ref.as_ref() {
            subpass = subpass.depth_stencil_attachment(depth_ref);
        }

        let dependencies: Vec<vk::SubpassDependency> = desc
            .dependencies
            .iter()
            .map(|d| {
                vk::SubpassDependency::default()
                    .src_subpass(subpass_to_vk(d.src))
                    .dst_subpass(subpass_to_vk(d.dst))
                    .src_stage_mask(pipeline_stages_to_vk(d.src_stages))
                    .dst_stage_mask(pipeline_stages_to_vk(d.dst_stages))
                    .src_access_mask(access_flags_to_vk(d.src_access))
                    .dst_access_mask(access_flags_to_vk(d.dst_access))
            })
            .collect();

        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(std::slice::from_ref(&subpass))
            .dependencies(&dependencies);
        let render_pass = unsafe {
            ctx.device
                .create_render_pass(&create_info, None)
                .map_err(|e| engine_err!("lumen3d::vulkan", "Failed to create render pass '{}': {:?}", desc.name, e))?
        };

        engine_debug!("lumen3d::vulkan", "Render pass '{}' ({:?}): {} color, {} resolve, depth {}",
            desc.name, desc.pass_type, color_refs.len(), resolve_refs.len(), depth_ref.is_some());

        Ok(Self {
            ctx: Arc::clone(ctx),
            name: desc.name.clone(),
            attachment_count: attachments.len(),
            render_pass,
        })
    }

    /// Number of slots; `begin_render_pass` needs one clear value per slot
    pub(crate) fn attachment_count(&self) -> usize {
        self.attachment_count
    }
}

impl GpuRenderPass for VulkanRenderPass {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for VulkanRenderPass {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_render_pass(self.render_pass, None);
        }
    }
}
